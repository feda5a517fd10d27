//! Register programs compiled from a tape.

use autogen_core::{apply, GraphError, Op, Tape};
use serde::{Deserialize, Serialize};

/// One register-machine instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// `r[dst] = value`
    Load { dst: usize, value: f64 },
    /// `r[dst] = op(r[src])`
    Unary { dst: usize, op: Op, src: usize },
    /// `r[dst] = op(r[lhs], r[rhs])`
    Binary {
        dst: usize,
        op: Op,
        lhs: usize,
        rhs: usize,
    },
}

impl Instruction {
    pub fn dst(&self) -> usize {
        match self {
            Instruction::Load { dst, .. }
            | Instruction::Unary { dst, .. }
            | Instruction::Binary { dst, .. } => *dst,
        }
    }

    fn sources(&self) -> Vec<usize> {
        match self {
            Instruction::Load { .. } => vec![],
            Instruction::Unary { src, .. } => vec![*src],
            Instruction::Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
        }
    }
}

/// A straight-line program over `f64` registers.
///
/// Registers `0..num_inputs` are loaded from the input vector; the remaining
/// registers are written by the instructions in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    num_inputs: usize,
    num_registers: usize,
    code: Vec<Instruction>,
    outputs: Vec<usize>,
}

impl Program {
    /// Lower a tape to a register program.
    ///
    /// With `fold_constants`, instructions whose operands are all constants are
    /// evaluated at compile time, and instructions no output depends on are
    /// removed afterwards.
    pub fn from_tape(tape: &Tape, fold_constants: bool) -> Program {
        let num_inputs = tape.num_inputs();
        let mut known: Vec<Option<f64>> = vec![None; tape.num_slots()];
        let mut code = Vec::with_capacity(tape.instrs().len());

        for (k, instr) in tape.instrs().iter().enumerate() {
            let dst = num_inputs + k;
            if let Op::Const(value) | Op::Leaf(value) = instr.op {
                known[dst] = Some(value);
                code.push(Instruction::Load { dst, value });
                continue;
            }

            if fold_constants {
                let values: Option<Vec<f64>> = instr.args.iter().map(|&a| known[a]).collect();
                if let Some(values) = values {
                    let refs: Vec<&f64> = values.iter().collect();
                    let value = apply::<f64>(instr.op, &refs);
                    known[dst] = Some(value);
                    code.push(Instruction::Load { dst, value });
                    continue;
                }
            }

            code.push(match instr.args.as_slice() {
                [src] => Instruction::Unary {
                    dst,
                    op: instr.op,
                    src: *src,
                },
                [lhs, rhs] => Instruction::Binary {
                    dst,
                    op: instr.op,
                    lhs: *lhs,
                    rhs: *rhs,
                },
                // Tapes only hold nullary, unary and binary operations
                _ => unreachable!("{} with {} operands", instr.op.name(), instr.args.len()),
            });
        }

        let mut program = Program {
            num_inputs,
            num_registers: tape.num_slots(),
            code,
            outputs: tape.outputs().to_vec(),
        };
        if fold_constants {
            program.eliminate_dead_code();
        }
        program
    }

    fn eliminate_dead_code(&mut self) {
        let mut live = vec![false; self.num_registers];
        for &o in &self.outputs {
            live[o] = true;
        }
        for instr in self.code.iter().rev() {
            if live[instr.dst()] {
                for s in instr.sources() {
                    live[s] = true;
                }
            }
        }
        self.code.retain(|instr| live[instr.dst()]);
    }

    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    pub fn num_registers(&self) -> usize {
        self.num_registers
    }

    pub fn code(&self) -> &[Instruction] {
        &self.code
    }

    pub fn outputs(&self) -> &[usize] {
        &self.outputs
    }

    /// Run the program on `x`.
    pub fn eval(&self, x: &[f64]) -> Result<Vec<f64>, GraphError> {
        if x.len() != self.num_inputs {
            return Err(GraphError::DimensionMismatch {
                expected: self.num_inputs,
                actual: x.len(),
            });
        }

        let mut r = vec![0.0; self.num_registers];
        r[..self.num_inputs].copy_from_slice(x);
        for instr in &self.code {
            match *instr {
                Instruction::Load { dst, value } => r[dst] = value,
                Instruction::Unary { dst, op, src } => r[dst] = apply::<f64>(op, &[&r[src]]),
                Instruction::Binary { dst, op, lhs, rhs } => {
                    r[dst] = match op {
                        Op::Add => r[lhs] + r[rhs],
                        Op::Sub => r[lhs] - r[rhs],
                        Op::Mul => r[lhs] * r[rhs],
                        Op::Div => r[lhs] / r[rhs],
                        _ => apply::<f64>(op, &[&r[lhs], &r[rhs]]),
                    }
                }
            }
        }
        Ok(self.outputs.iter().map(|&o| r[o]).collect())
    }
}
