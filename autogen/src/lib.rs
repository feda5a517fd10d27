//! # autogen - Mode-scoped tracing of numeric functions
//!
//! Write a vector function once, generically over [`Scalar`], and run it as
//! plain `f64` code, trace it into a graph differentiated with dual numbers,
//! or trace it into a graph compiled to a register program with a symbolic
//! Jacobian.
//!
//! ## Quick Start
//!
//! ```
//! use autogen::prelude::*;
//!
//! struct Rosenbrock;
//!
//! impl VectorFunction for Rosenbrock {
//!     fn eval<S: Scalar>(&self, x: &[S]) -> Vec<S> {
//!         let a = S::constant(1.0) - x[0].clone();
//!         let b = x[1].clone() - x[0].clone() * x[0].clone();
//!         vec![a.clone() * a + b.clone() * b * 100.0]
//!     }
//! }
//!
//! let mut f = GeneratedFunction::new(Rosenbrock, "rosenbrock")
//!     .with_mode(Mode::CodeGenAD)
//!     .unwrap();
//! f.trace(&[0.0, 0.0]).unwrap();
//! f.compile().unwrap();
//!
//! assert_eq!(f.call(&[1.0, 1.0]).unwrap(), vec![0.0]);
//! assert_eq!(f.jacobian(&[1.0, 1.0]).unwrap(), vec![vec![0.0, 0.0]]);
//! ```
//!
//! ## Modes
//!
//! | Mode | Scalar | Graph | Jacobian |
//! |------|--------|-------|----------|
//! | [`Mode::Numerical`] | `f64` | none | unsupported |
//! | [`Mode::DualNumberAD`] | [`ADScalar`](autogen_core::ADScalar) | recorded | one dual sweep per input |
//! | [`Mode::CodeGenAD`] | [`CGScalar`](autogen_core::CGScalar) | recorded, compilable | one reverse sweep per output, or compiled |
//! | [`Mode::GPU`] | - | - | unsupported |
//!
//! [`trace`] with `None` uses the process-wide mode held by [`Scope`].

mod backend;
mod error;
mod function;
mod generated;
mod graph;
mod mode;
mod scope;
mod trace;

pub use autogen_codegen::{CompileOptions, CompiledModel, Library};
pub use autogen_core::Scalar;
pub use backend::{Backend, CodeGenBackend, DualBackend, GraphBuilder, NumericalBackend};
pub use error::{Error, Result};
pub use function::VectorFunction;
pub use generated::GeneratedFunction;
pub use graph::ComputationalGraph;
pub use mode::{
    resolve_backend, resolve_scalar_type, resolve_vector_type, BackendTypes, Mode, ScalarRepr, VectorRepr,
};
pub use scope::{Scope, ScopeGuard};
pub use trace::{trace, trace_in};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::function::VectorFunction;
    pub use crate::generated::GeneratedFunction;
    pub use crate::graph::ComputationalGraph;
    pub use crate::mode::Mode;
    pub use crate::scope::Scope;
    pub use crate::trace::trace;
    pub use autogen_codegen::CompileOptions;
    pub use autogen_core::Scalar;
}
