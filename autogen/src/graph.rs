//! Traced computational graphs.

use autogen_codegen::{compile, CompileOptions, CompiledModel};
use autogen_core::{Dual, Expr, Tape};
use log::trace;

use crate::error::{Error, Result};
use crate::mode::Mode;

/// The recorded graph of one traced function.
///
/// Owns the independent and dependent variables and the tape linking them.
/// The graph never changes after tracing; compiling it produces a separate
/// [`CompiledModel`].
#[derive(Debug, Clone)]
pub struct ComputationalGraph {
    mode: Mode,
    independents: Vec<Expr>,
    dependents: Vec<Expr>,
    tape: Tape,
}

impl ComputationalGraph {
    pub(crate) fn new(mode: Mode, independents: Vec<Expr>, dependents: Vec<Expr>, tape: Tape) -> Self {
        ComputationalGraph {
            mode,
            independents,
            dependents,
            tape,
        }
    }

    /// The mode the graph was traced in.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Number of independent variables.
    pub fn input_dim(&self) -> usize {
        self.independents.len()
    }

    /// Number of dependent variables.
    pub fn output_dim(&self) -> usize {
        self.dependents.len()
    }

    /// Independent variables, in input order.
    pub fn independents(&self) -> &[Expr] {
        &self.independents
    }

    /// Dependent variables, in output order.
    pub fn dependents(&self) -> &[Expr] {
        &self.dependents
    }

    /// The linearized operations connecting inputs to outputs.
    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// Evaluate the graph at `x`.
    pub fn forward(&self, x: &[f64]) -> Result<Vec<f64>> {
        Ok(self.tape.eval(x)?)
    }

    /// Directional derivative `J(x) v` in one forward sweep.
    pub fn jvp(&self, x: &[f64], v: &[f64]) -> Result<Vec<f64>> {
        if v.len() != x.len() {
            return Err(Error::DimensionMismatch {
                expected: x.len(),
                actual: v.len(),
            });
        }
        let seeded: Vec<Dual> = x.iter().zip(v).map(|(&re, &eps)| Dual::new(re, eps)).collect();
        Ok(self.tape.eval(&seeded)?.into_iter().map(|d| d.eps).collect())
    }

    /// Jacobian at `x`, row-major `output_dim x input_dim`.
    ///
    /// Dual-number graphs take one forward sweep per input; code-generation
    /// graphs take one reverse sweep per output.
    pub fn jacobian(&self, x: &[f64]) -> Result<Vec<Vec<f64>>> {
        match self.mode {
            Mode::DualNumberAD => self.forward_jacobian(x),
            Mode::CodeGenAD => Ok(self.tape.reverse_jacobian(x)?),
            mode => Err(Error::UnsupportedMode {
                mode,
                operation: "jacobian",
            }),
        }
    }

    fn forward_jacobian(&self, x: &[f64]) -> Result<Vec<Vec<f64>>> {
        let n = self.input_dim();
        if x.len() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                actual: x.len(),
            });
        }

        let mut jac = vec![vec![0.0; n]; self.output_dim()];
        let mut seeded: Vec<Dual> = x.iter().map(|&v| Dual::from(v)).collect();
        for j in 0..n {
            seeded[j].eps = 1.0;
            let column = self.tape.eval(&seeded)?;
            seeded[j].eps = 0.0;
            for (row, d) in jac.iter_mut().zip(column) {
                row[j] = d.eps;
            }
            trace!("jacobian column {}/{}", j + 1, n);
        }
        Ok(jac)
    }

    /// Compile the graph into a model called `name`. Code-generation graphs only.
    pub fn compile(&self, name: &str, options: &CompileOptions) -> Result<CompiledModel> {
        if self.mode != Mode::CodeGenAD {
            return Err(Error::UnsupportedMode {
                mode: self.mode,
                operation: "compile",
            });
        }
        Ok(compile(name, &self.tape, options)?)
    }

    /// The recorded tape as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.tape)?)
    }
}
