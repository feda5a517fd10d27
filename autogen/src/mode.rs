//! Evaluation modes and the registry mapping each mode to its types.

use std::fmt;
use std::str::FromStr;

use autogen_core::{ADScalar, CGScalar};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Selects the numeric or symbolic backend a trace or evaluation uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Plain `f64` evaluation.
    Numerical,
    /// Recorded graph differentiated with dual numbers.
    DualNumberAD,
    /// Recorded graph that can be compiled to generated code.
    CodeGenAD,
    /// Reserved; no backend is available.
    GPU,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Numerical, Mode::DualNumberAD, Mode::CodeGenAD, Mode::GPU];

    /// Whether tracing in this mode produces a differentiable graph.
    pub fn is_differentiable(self) -> bool {
        matches!(self, Mode::DualNumberAD | Mode::CodeGenAD)
    }

    /// Canonical name, as accepted by `FromStr`.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Numerical => "Numerical",
            Mode::DualNumberAD => "DualNumberAD",
            Mode::CodeGenAD => "CodeGenAD",
            Mode::GPU => "GPU",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Mode::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidInput(format!("unknown mode `{s}`")))
    }
}

/// Scalar representation used by a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarRepr {
    Float64,
    ADScalar,
    CGScalar,
}

impl ScalarRepr {
    /// The Rust type implementing this representation.
    pub fn type_name(self) -> &'static str {
        match self {
            ScalarRepr::Float64 => std::any::type_name::<f64>(),
            ScalarRepr::ADScalar => std::any::type_name::<ADScalar>(),
            ScalarRepr::CGScalar => std::any::type_name::<CGScalar>(),
        }
    }
}

/// Vector representation used by a mode: an ordered sequence of its scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorRepr {
    pub element: ScalarRepr,
}

impl VectorRepr {
    pub fn type_name(self) -> &'static str {
        match self.element {
            ScalarRepr::Float64 => std::any::type_name::<Vec<f64>>(),
            ScalarRepr::ADScalar => std::any::type_name::<Vec<ADScalar>>(),
            ScalarRepr::CGScalar => std::any::type_name::<Vec<CGScalar>>(),
        }
    }
}

/// The resolved scalar and vector representations of a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendTypes {
    pub scalar: ScalarRepr,
    pub vector: VectorRepr,
}

/// Resolve the scalar and vector representations for `mode`.
///
/// `GPU` has no backend and fails with [`Error::UnsupportedMode`].
pub fn resolve_backend(mode: Mode) -> Result<BackendTypes> {
    let scalar = match mode {
        Mode::Numerical => ScalarRepr::Float64,
        Mode::DualNumberAD => ScalarRepr::ADScalar,
        Mode::CodeGenAD => ScalarRepr::CGScalar,
        Mode::GPU => {
            return Err(Error::UnsupportedMode {
                mode,
                operation: "backend resolution",
            })
        }
    };
    Ok(BackendTypes {
        scalar,
        vector: VectorRepr { element: scalar },
    })
}

/// Scalar representation for `mode`.
pub fn resolve_scalar_type(mode: Mode) -> Result<ScalarRepr> {
    resolve_backend(mode).map(|types| types.scalar)
}

/// Vector representation for `mode`.
pub fn resolve_vector_type(mode: Mode) -> Result<VectorRepr> {
    resolve_backend(mode).map(|types| types.vector)
}
