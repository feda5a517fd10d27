//! Error types for compilation and compiled-model lookup.

use autogen_core::GraphError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodegenError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The model was compiled without a Jacobian program.
    #[error("model `{model}` was compiled without a jacobian")]
    MissingJacobian { model: String },

    #[error("no model named `{name}` in library")]
    UnknownModel { name: String },
}
