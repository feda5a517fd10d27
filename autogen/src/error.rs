//! Error types for tracing and generated functions.

use autogen_codegen::CodegenError;
use autogen_core::GraphError;
use thiserror::Error;

use crate::mode::Mode;

/// Errors raised by the tracing core.
#[derive(Debug, Error)]
pub enum Error {
    /// The sample or evaluation input is empty or contains non-finite values.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The mode has no backend, or the operation is not available in it.
    #[error("{operation} is not supported in {mode} mode")]
    UnsupportedMode { mode: Mode, operation: &'static str },

    /// Tracing was attempted in a mode that cannot produce a graph.
    #[error("cannot trace a graph in {mode} mode")]
    UnsupportedTraceMode { mode: Mode },

    /// A backend object was misused, e.g. its inputs were marked twice.
    #[error("backend state error: {0}")]
    BackendState(#[source] GraphError),

    #[error("dimension mismatch: expected {expected} inputs, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The operation needs a traced graph and none exists.
    #[error("`{function}` has no computational graph; trace it first")]
    NoGraph { function: String },

    #[error("code generation failed: {0}")]
    Codegen(#[source] CodegenError),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<GraphError> for Error {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::DimensionMismatch { expected, actual } => {
                Error::DimensionMismatch { expected, actual }
            }
            other => Error::BackendState(other),
        }
    }
}

impl From<CodegenError> for Error {
    fn from(err: CodegenError) -> Self {
        match err {
            CodegenError::Graph(graph) => graph.into(),
            other => Error::Codegen(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
