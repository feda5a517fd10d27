//! The tracer: runs a function once on recorded inputs.

use log::debug;

use crate::backend::{Backend, CodeGenBackend, DualBackend, GraphBuilder, NumericalBackend};
use crate::error::{Error, Result};
use crate::function::VectorFunction;
use crate::graph::ComputationalGraph;
use crate::mode::{resolve_backend, Mode, ScalarRepr};
use crate::scope::Scope;

/// Trace `function` at the sample point `xs`.
///
/// With `Some(mode)` the mode is entered into [`Scope`] first and used for
/// this trace; with `None` the active mode is read from [`Scope`].
///
/// ```
/// use autogen::prelude::*;
///
/// struct Sum;
///
/// impl VectorFunction for Sum {
///     fn eval<S: Scalar>(&self, x: &[S]) -> Vec<S> {
///         vec![x[0].clone() + x[1].clone()]
///     }
/// }
///
/// let graph = trace(&Sum, &[2.0, 3.0], Some(Mode::DualNumberAD)).unwrap();
/// assert_eq!(graph.forward(&[2.0, 3.0]).unwrap(), vec![5.0]);
/// assert_eq!(graph.jacobian(&[2.0, 3.0]).unwrap(), vec![vec![1.0, 1.0]]);
/// ```
pub fn trace<F: VectorFunction>(function: &F, xs: &[f64], mode: Option<Mode>) -> Result<ComputationalGraph> {
    validate_sample(xs)?;
    let mode = match mode {
        Some(mode) => {
            Scope::enter(mode);
            mode
        }
        None => Scope::current_mode(),
    };
    trace_in(function, xs, mode)
}

/// Trace in `mode` without consulting or changing [`Scope`].
pub fn trace_in<F: VectorFunction>(function: &F, xs: &[f64], mode: Mode) -> Result<ComputationalGraph> {
    validate_sample(xs)?;
    let types = resolve_backend(mode)?;
    let graph = match types.scalar {
        ScalarRepr::Float64 => trace_with::<NumericalBackend, F>(function, xs),
        ScalarRepr::ADScalar => trace_with::<DualBackend, F>(function, xs),
        ScalarRepr::CGScalar => trace_with::<CodeGenBackend, F>(function, xs),
    }?;
    debug!(
        "traced {} -> {} in {} mode ({}, {} instructions)",
        graph.input_dim(),
        graph.output_dim(),
        mode,
        types.vector.type_name(),
        graph.tape().instrs().len()
    );
    Ok(graph)
}

fn trace_with<B: Backend, F: VectorFunction>(function: &F, xs: &[f64]) -> Result<ComputationalGraph> {
    let mut builder = GraphBuilder::new();
    let x = B::make_vector(xs);
    B::mark_independent(&mut builder, &x)?;
    let y = function.eval(&x);
    B::build_graph(builder, y)
}

pub(crate) fn validate_sample(xs: &[f64]) -> Result<()> {
    if xs.is_empty() {
        return Err(Error::InvalidInput("sample input is empty".to_string()));
    }
    if let Some((i, v)) = xs.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(Error::InvalidInput(format!("sample element {i} is not finite: {v}")));
    }
    Ok(())
}
