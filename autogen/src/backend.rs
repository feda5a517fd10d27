//! Per-mode backends driven by the tracer.

use autogen_core::{ADScalar, CGScalar, Expr, GraphError, Recorded, Scalar, Tape, TapeId};

use crate::error::{Error, Result};
use crate::graph::ComputationalGraph;
use crate::mode::Mode;

enum BuilderState {
    Building,
    Sealed(Vec<Expr>),
}

/// Collects the pieces of one graph while a function is being traced.
///
/// Independent variables are marked exactly once (`Building -> Sealed`);
/// a second attempt fails with [`Error::BackendState`].
pub struct GraphBuilder {
    tape: TapeId,
    state: BuilderState,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        GraphBuilder::new()
    }
}

impl GraphBuilder {
    /// Start a builder bound to a fresh tape id.
    pub fn new() -> Self {
        GraphBuilder {
            tape: TapeId::next(),
            state: BuilderState::Building,
        }
    }

    /// The tape the independent variables are marked for.
    pub fn tape_id(&self) -> TapeId {
        self.tape
    }

    /// Whether the independent variables have been marked.
    pub fn is_sealed(&self) -> bool {
        matches!(self.state, BuilderState::Sealed(_))
    }

    /// Mark `independents` as the inputs of this graph, in order.
    pub fn seal(&mut self, independents: Vec<Expr>) -> Result<()> {
        if self.is_sealed() {
            return Err(Error::BackendState(GraphError::AlreadySealed { tape: self.tape }));
        }
        for (i, x) in independents.iter().enumerate() {
            x.mark_independent(self.tape, i).map_err(Error::BackendState)?;
        }
        self.state = BuilderState::Sealed(independents);
        Ok(())
    }

    /// Record the graph connecting the sealed inputs to `dependents`.
    pub fn finish(self, mode: Mode, dependents: Vec<Expr>) -> Result<ComputationalGraph> {
        let BuilderState::Sealed(independents) = self.state else {
            return Err(Error::BackendState(GraphError::NotSealed { tape: self.tape }));
        };
        let tape = Tape::record(self.tape, &independents, &dependents).map_err(Error::BackendState)?;
        Ok(ComputationalGraph::new(mode, independents, dependents, tape))
    }
}

/// The capabilities the tracer needs from an evaluation backend.
pub trait Backend {
    const MODE: Mode;
    type Scalar: Scalar;

    fn make_scalar(value: f64) -> Self::Scalar;

    fn make_vector(values: &[f64]) -> Vec<Self::Scalar> {
        values.iter().map(|&v| Self::make_scalar(v)).collect()
    }

    fn mark_independent(builder: &mut GraphBuilder, x: &[Self::Scalar]) -> Result<()>;

    fn build_graph(builder: GraphBuilder, y: Vec<Self::Scalar>) -> Result<ComputationalGraph>;
}

/// Plain `f64` evaluation. Nothing is recorded, so no graph can be built.
pub struct NumericalBackend;

impl Backend for NumericalBackend {
    const MODE: Mode = Mode::Numerical;
    type Scalar = f64;

    fn make_scalar(value: f64) -> f64 {
        value
    }

    fn mark_independent(_builder: &mut GraphBuilder, _x: &[f64]) -> Result<()> {
        Err(Error::UnsupportedTraceMode { mode: Self::MODE })
    }

    fn build_graph(_builder: GraphBuilder, _y: Vec<f64>) -> Result<ComputationalGraph> {
        Err(Error::UnsupportedTraceMode { mode: Self::MODE })
    }
}

fn exprs<R: Recorded>(values: &[R]) -> Vec<Expr> {
    values.iter().map(|v| v.expr().clone()).collect()
}

/// Records with [`ADScalar`]; Jacobians come from dual-number sweeps.
pub struct DualBackend;

impl Backend for DualBackend {
    const MODE: Mode = Mode::DualNumberAD;
    type Scalar = ADScalar;

    fn make_scalar(value: f64) -> ADScalar {
        ADScalar::leaf(value)
    }

    fn mark_independent(builder: &mut GraphBuilder, x: &[ADScalar]) -> Result<()> {
        builder.seal(exprs(x))
    }

    fn build_graph(builder: GraphBuilder, y: Vec<ADScalar>) -> Result<ComputationalGraph> {
        builder.finish(Self::MODE, exprs(&y))
    }
}

/// Records with [`CGScalar`]; graphs can be compiled.
pub struct CodeGenBackend;

impl Backend for CodeGenBackend {
    const MODE: Mode = Mode::CodeGenAD;
    type Scalar = CGScalar;

    fn make_scalar(value: f64) -> CGScalar {
        CGScalar::leaf(value)
    }

    fn mark_independent(builder: &mut GraphBuilder, x: &[CGScalar]) -> Result<()> {
        builder.seal(exprs(x))
    }

    fn build_graph(builder: GraphBuilder, y: Vec<CGScalar>) -> Result<ComputationalGraph> {
        builder.finish(Self::MODE, exprs(&y))
    }
}
