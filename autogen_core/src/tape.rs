//! Linear operation sequences recorded from a DAG.
//!
//! A [`Tape`] is the flattened form of the expressions connecting a set of
//! independent variables to a set of dependent ones:
//! 1. slots `0..num_inputs` hold the independent variables, in order
//! 2. every instruction appends one slot, computed from earlier slots
//! 3. `outputs` names the slot of each dependent variable, in order
//!
//! Because each instruction only refers to earlier slots, a forward sweep is a
//! single pass and a reverse sweep is the same pass backwards.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::node::{Expr, NodeId, Op};
use crate::ops::{apply, partials};
use crate::scalar::Scalar;

static TAPE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Identity of one recording. Independent variables are bound to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TapeId(u64);

impl TapeId {
    /// Allocate a fresh, process-unique tape id.
    pub fn next() -> Self {
        TapeId(TAPE_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// One tape instruction: `slot[num_inputs + k] = op(slot[args[0]], ...)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instr {
    pub op: Op,
    pub args: Vec<usize>,
}

/// A recorded operation sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tape {
    id: TapeId,
    num_inputs: usize,
    instrs: Vec<Instr>,
    outputs: Vec<usize>,
}

impl Tape {
    /// Linearize the expressions reachable from `dependents`.
    ///
    /// Each entry of `independents` must already be marked as independent
    /// variable `i` of tape `id`. Leaves that were never marked are recorded
    /// as constants; leaves bound to any other position or tape are rejected.
    pub fn record(id: TapeId, independents: &[Expr], dependents: &[Expr]) -> Result<Tape, GraphError> {
        let mut slots: HashMap<NodeId, usize> = HashMap::with_capacity(independents.len());
        for (i, x) in independents.iter().enumerate() {
            match x.independent() {
                Some(ind) if ind.tape == id && ind.index == i => {
                    slots.insert(x.id(), i);
                }
                Some(ind) => {
                    return Err(GraphError::ForeignVariable {
                        node: x.id(),
                        owner: ind.tape,
                        tape: id,
                    })
                }
                None => return Err(GraphError::NotIndependent { node: x.id(), index: i }),
            }
        }

        let num_inputs = independents.len();
        let mut instrs: Vec<Instr> = Vec::new();

        // Iterative postorder DFS; deep chains would overflow a recursive walk.
        let mut stack: Vec<(Expr, bool)> = dependents.iter().rev().map(|e| (e.clone(), false)).collect();
        while let Some((expr, expanded)) = stack.pop() {
            if slots.contains_key(&expr.id()) {
                continue;
            }

            if !expanded && !expr.children().is_empty() {
                stack.push((expr.clone(), true));
                for child in expr.children().iter().rev() {
                    if !slots.contains_key(&child.id()) {
                        stack.push((child.clone(), false));
                    }
                }
                continue;
            }

            let instr = match *expr.op() {
                Op::Leaf(value) => {
                    if let Some(ind) = expr.independent() {
                        return Err(GraphError::ForeignVariable {
                            node: expr.id(),
                            owner: ind.tape,
                            tape: id,
                        });
                    }
                    Instr {
                        op: Op::Const(value),
                        args: vec![],
                    }
                }
                op => Instr {
                    op,
                    args: expr.children().iter().map(|c| slots[&c.id()]).collect(),
                },
            };
            slots.insert(expr.id(), num_inputs + instrs.len());
            instrs.push(instr);
        }

        let outputs = dependents.iter().map(|e| slots[&e.id()]).collect();

        Ok(Tape {
            id,
            num_inputs,
            instrs,
            outputs,
        })
    }

    /// Assemble a tape from parts, checking that every argument refers to an earlier slot.
    pub fn from_parts(
        id: TapeId,
        num_inputs: usize,
        instrs: Vec<Instr>,
        outputs: Vec<usize>,
    ) -> Result<Tape, GraphError> {
        for (k, instr) in instrs.iter().enumerate() {
            let slot = num_inputs + k;
            if instr.args.len() != instr.op.arity() || instr.args.iter().any(|&a| a >= slot) {
                return Err(GraphError::DimensionMismatch {
                    expected: slot,
                    actual: instr.args.iter().copied().max().unwrap_or(slot),
                });
            }
        }
        let num_slots = num_inputs + instrs.len();
        if let Some(&bad) = outputs.iter().find(|&&o| o >= num_slots) {
            return Err(GraphError::DimensionMismatch {
                expected: num_slots,
                actual: bad,
            });
        }
        Ok(Tape {
            id,
            num_inputs,
            instrs,
            outputs,
        })
    }

    pub fn id(&self) -> TapeId {
        self.id
    }

    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Total number of slots (inputs plus instructions).
    pub fn num_slots(&self) -> usize {
        self.num_inputs + self.instrs.len()
    }

    pub fn instrs(&self) -> &[Instr] {
        &self.instrs
    }

    /// Slot of each dependent variable, in order.
    pub fn outputs(&self) -> &[usize] {
        &self.outputs
    }

    fn check_inputs(&self, actual: usize) -> Result<(), GraphError> {
        if actual != self.num_inputs {
            return Err(GraphError::DimensionMismatch {
                expected: self.num_inputs,
                actual,
            });
        }
        Ok(())
    }

    /// Forward sweep returning the value of every slot.
    pub fn eval_slots<S: Scalar>(&self, inputs: &[S]) -> Result<Vec<S>, GraphError> {
        self.check_inputs(inputs.len())?;
        let mut slots: Vec<S> = Vec::with_capacity(self.num_slots());
        slots.extend_from_slice(inputs);
        for instr in &self.instrs {
            let value = {
                let args: Vec<&S> = instr.args.iter().map(|&a| &slots[a]).collect();
                apply(instr.op, &args)
            };
            slots.push(value);
        }
        Ok(slots)
    }

    /// Forward sweep returning the dependent variables.
    pub fn eval<S: Scalar>(&self, inputs: &[S]) -> Result<Vec<S>, GraphError> {
        let slots = self.eval_slots(inputs)?;
        Ok(self.outputs.iter().map(|&o| slots[o].clone()).collect())
    }

    /// Jacobian by reverse accumulation, one sweep per output.
    ///
    /// Row `i` holds d(output_i)/d(input_j). With `S = f64` this is a numeric
    /// Jacobian; with a recorded scalar it yields derivative expressions.
    pub fn reverse_jacobian<S: Scalar>(&self, inputs: &[S]) -> Result<Vec<Vec<S>>, GraphError> {
        let slots = self.eval_slots(inputs)?;
        let mut rows = Vec::with_capacity(self.outputs.len());

        for &output in &self.outputs {
            let mut adjoints: Vec<Option<S>> = vec![None; slots.len()];
            adjoints[output] = Some(S::constant(1.0));

            for (k, instr) in self.instrs.iter().enumerate().rev() {
                let slot = self.num_inputs + k;
                let Some(adjoint) = adjoints[slot].take() else {
                    continue;
                };
                let args: Vec<&S> = instr.args.iter().map(|&a| &slots[a]).collect();
                let local = partials(instr.op, &args, &slots[slot]);
                for (&arg, partial) in instr.args.iter().zip(local.iter()) {
                    // Chain rule: arg_adjoint += adjoint * local_partial
                    if let Some(contribution) = partial.scale(&adjoint) {
                        adjoints[arg] = Some(match adjoints[arg].take() {
                            Some(acc) => acc + contribution,
                            None => contribution,
                        });
                    }
                }
            }

            let row = adjoints
                .into_iter()
                .take(self.num_inputs)
                .map(|a| a.unwrap_or_else(|| S::constant(0.0)))
                .collect();
            rows.push(row);
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn inputs(tape: TapeId, values: &[f64]) -> Vec<Expr> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let x = Expr::leaf(v);
                x.mark_independent(tape, i).unwrap();
                x
            })
            .collect()
    }

    #[test]
    fn test_record_simple_sum() {
        let id = TapeId::next();
        let x = inputs(id, &[2.0, 3.0]);
        let z = Expr::apply(Op::Add, vec![x[0].clone(), x[1].clone()]);

        let tape = Tape::record(id, &x, &[z]).unwrap();
        assert_eq!(tape.num_inputs(), 2);
        assert_eq!(tape.num_outputs(), 1);
        assert_eq!(tape.instrs().len(), 1);
        assert_eq!(tape.outputs(), &[2]);

        assert_eq!(tape.eval(&[2.0, 3.0]).unwrap(), vec![5.0]);
        assert_eq!(tape.eval(&[-1.0, 4.0]).unwrap(), vec![3.0]);
    }

    #[test]
    fn test_shared_node_recorded_once() {
        // z = (x * x) + (x * x) with the product shared
        let id = TapeId::next();
        let x = inputs(id, &[3.0]);
        let sq = Expr::apply(Op::Mul, vec![x[0].clone(), x[0].clone()]);
        let z = Expr::apply(Op::Add, vec![sq.clone(), sq]);

        let tape = Tape::record(id, &x, &[z]).unwrap();
        assert_eq!(tape.instrs().len(), 2);
        assert_eq!(tape.eval(&[3.0]).unwrap(), vec![18.0]);
    }

    #[test]
    fn test_unmarked_leaf_is_constant() {
        let id = TapeId::next();
        let x = inputs(id, &[2.0]);
        let p = Expr::leaf(10.0);
        let z = Expr::apply(Op::Mul, vec![x[0].clone(), p]);

        let tape = Tape::record(id, &x, &[z]).unwrap();
        assert_eq!(tape.eval(&[5.0]).unwrap(), vec![50.0]);
    }

    #[test]
    fn test_foreign_variable_rejected() {
        let id = TapeId::next();
        let other = TapeId::next();
        let x = inputs(id, &[1.0]);
        let y = inputs(other, &[1.0]);
        let z = Expr::apply(Op::Add, vec![x[0].clone(), y[0].clone()]);

        let err = Tape::record(id, &x, &[z]).unwrap_err();
        assert!(matches!(err, GraphError::ForeignVariable { owner, .. } if owner == other));
    }

    #[test]
    fn test_unmarked_independent_rejected() {
        let id = TapeId::next();
        let x = vec![Expr::leaf(1.0)];
        let err = Tape::record(id, &x, &x).unwrap_err();
        assert_eq!(err, GraphError::NotIndependent { node: x[0].id(), index: 0 });
    }

    #[test]
    fn test_eval_dimension_mismatch() {
        let id = TapeId::next();
        let x = inputs(id, &[1.0, 2.0]);
        let tape = Tape::record(id, &x, &x).unwrap();
        let err = tape.eval(&[1.0]).unwrap_err();
        assert_eq!(err, GraphError::DimensionMismatch { expected: 2, actual: 1 });
    }

    #[test]
    fn test_reverse_jacobian_numeric() {
        // f(x, y) = [x * y, sin(x)]
        let id = TapeId::next();
        let x = inputs(id, &[0.5, 2.0]);
        let xy = Expr::apply(Op::Mul, vec![x[0].clone(), x[1].clone()]);
        let s = Expr::apply(Op::Sin, vec![x[0].clone()]);
        let tape = Tape::record(id, &x, &[xy, s]).unwrap();

        let jac = tape.reverse_jacobian(&[0.5, 2.0]).unwrap();
        assert_relative_eq!(jac[0][0], 2.0);
        assert_relative_eq!(jac[0][1], 0.5);
        assert_relative_eq!(jac[1][0], 0.5_f64.cos());
        assert_relative_eq!(jac[1][1], 0.0);
    }

    #[test]
    fn test_output_can_be_an_input() {
        let id = TapeId::next();
        let x = inputs(id, &[4.0, 5.0]);
        let tape = Tape::record(id, &x, &[x[1].clone()]).unwrap();
        assert!(tape.instrs().is_empty());
        assert_eq!(tape.eval(&[4.0, 5.0]).unwrap(), vec![5.0]);
        assert_eq!(tape.reverse_jacobian(&[4.0, 5.0]).unwrap(), vec![vec![0.0, 1.0]]);
    }

    #[test]
    fn test_from_parts_rejects_forward_reference() {
        let instrs = vec![Instr {
            op: Op::Neg,
            args: vec![1],
        }];
        assert!(Tape::from_parts(TapeId::next(), 1, instrs, vec![1]).is_err());
    }
}
