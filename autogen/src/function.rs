//! User-supplied functions.

use autogen_core::Scalar;

/// A function from a vector of scalars to a vector of scalars, written once
/// for every backend.
///
/// Implementations must not branch on concrete values: in the recording
/// modes each arithmetic operation is captured rather than computed, and only
/// the operations performed during the single traced call end up in the graph.
///
/// ```
/// use autogen::prelude::*;
///
/// struct Hypot;
///
/// impl VectorFunction for Hypot {
///     fn eval<S: Scalar>(&self, x: &[S]) -> Vec<S> {
///         vec![(x[0].clone() * x[0].clone() + x[1].clone() * x[1].clone()).sqrt()]
///     }
/// }
///
/// assert_eq!(Hypot.eval(&[3.0, 4.0]), vec![5.0]);
/// ```
pub trait VectorFunction {
    fn eval<S: Scalar>(&self, x: &[S]) -> Vec<S>;
}

impl<F: VectorFunction + ?Sized> VectorFunction for &F {
    fn eval<S: Scalar>(&self, x: &[S]) -> Vec<S> {
        (**self).eval(x)
    }
}
