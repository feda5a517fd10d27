//! # autogen_core - Recording engine for mode-scoped automatic differentiation
//!
//! This crate provides the scalar types and graph machinery that the `autogen`
//! tracer drives. A numeric function written once against [`Scalar`] can be run
//! on plain `f64`, on forward-mode [`Dual`] numbers, or on the recorded handles
//! [`ADScalar`] and [`CGScalar`], which build a DAG while they compute.
//!
//! ## Quick Start
//!
//! ```
//! use autogen_core::{ADScalar, Recorded, Scalar, Tape, TapeId};
//!
//! fn f<S: Scalar>(x: &[S]) -> Vec<S> {
//!     vec![x[0].clone() * x[1].clone() + x[0].sin()]
//! }
//!
//! // Create the inputs and bind them to a new recording
//! let tape_id = TapeId::next();
//! let x = vec![ADScalar::new(2.0), ADScalar::new(3.0)];
//! for (i, xi) in x.iter().enumerate() {
//!     xi.expr().mark_independent(tape_id, i).unwrap();
//! }
//!
//! // Run the function once; the arithmetic is recorded
//! let y = f(&x);
//! assert!((y[0].value() - 6.909297426825682).abs() < 1e-10);
//!
//! // Flatten into a tape and differentiate
//! let xs: Vec<_> = x.iter().map(|s| s.expr().clone()).collect();
//! let ys: Vec<_> = y.iter().map(|s| s.expr().clone()).collect();
//! let tape = Tape::record(tape_id, &xs, &ys).unwrap();
//!
//! let jac = tape.reverse_jacobian(&[2.0, 3.0]).unwrap();
//! // d/dx = y + cos(x), d/dy = x
//! assert!((jac[0][0] - 2.5838531634528574).abs() < 1e-10);
//! assert!((jac[0][1] - 2.0).abs() < 1e-10);
//! ```
//!
//! ## Supported Operations
//!
//! | Category | Operations |
//! |----------|------------|
//! | Arithmetic | `+`, `-`, `*`, `/`, unary `-`, with `f64` on either side |
//! | Power | [`Scalar::powf`], [`Scalar::pow`] |
//! | Transcendental | `exp`, `ln`, `exp_m1`, `ln_1p`, `erf`, trigonometric, hyperbolic and their inverses |
//! | Other | `sqrt`, `abs`, `sign` |
//!
//! ## Architecture
//!
//! - **[`Expr`]**: reference-counted node handle; leaves can be marked independent once.
//! - **[`Tape`]**: linear operation sequence with generic forward and reverse sweeps.
//! - **[`finite_diff_jacobian`]**: numerical Jacobians for validating AD results.

mod dual;
mod error;
mod finite_diff;
mod node;
mod ops;
mod recorded;
mod scalar;
mod tape;

pub use dual::Dual;
pub use error::GraphError;
pub use finite_diff::{finite_diff_jacobian, max_abs_error};
pub use node::{Expr, Independent, NodeId, Op};
pub use ops::{apply, partials, Partial};
pub use recorded::{ADScalar, CGScalar, Recorded};
pub use scalar::Scalar;
pub use tape::{Instr, Tape, TapeId};
