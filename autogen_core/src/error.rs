//! Error types for graph recording and evaluation.

use thiserror::Error;

use crate::node::NodeId;
use crate::tape::TapeId;

/// Errors raised by the recording engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// A leaf was marked independent a second time.
    #[error("node {node:?} is already independent variable {index} of tape {tape:?}")]
    AlreadyIndependent {
        node: NodeId,
        tape: TapeId,
        index: usize,
    },

    /// Only leaves created from a numeric value can become independent variables.
    #[error("only leaf values can be marked independent, got a `{op}` node")]
    NotALeaf { op: &'static str },

    /// An entry of the independent vector was never marked independent.
    #[error("input {index} (node {node:?}) was not marked independent")]
    NotIndependent { node: NodeId, index: usize },

    /// A recorded expression references a variable that is not an input of this tape.
    #[error("node {node:?} is an independent variable of {owner:?}, not an input of tape {tape:?}")]
    ForeignVariable {
        node: NodeId,
        owner: TapeId,
        tape: TapeId,
    },

    /// The independent variables of a recording were marked a second time.
    #[error("independent variables of tape {tape:?} are already marked")]
    AlreadySealed { tape: TapeId },

    /// Dependent variables were supplied before any independent variables were marked.
    #[error("tape {tape:?} has no independent variables yet")]
    NotSealed { tape: TapeId },

    /// An input vector has the wrong length.
    #[error("dimension mismatch: expected {expected} inputs, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
