//! The scalar capability shared by every evaluation backend.
//!
//! A user function is written once against [`Scalar`] and can then be run on
//! plain `f64` values, on forward-mode [`Dual`](crate::Dual) numbers, or on the
//! recorded handles [`ADScalar`](crate::ADScalar) and
//! [`CGScalar`](crate::CGScalar) that build a computation graph as a side
//! effect of the arithmetic.

use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Arithmetic and elementary functions required from a backend scalar.
///
/// Methods take `&self` so that recorded handles can be reused without
/// consuming them. Binary operators are only required for owned values of the
/// same type and for an `f64` right operand; concrete types additionally
/// implement the mirrored `f64 op Self` forms.
pub trait Scalar:
    Clone
    + Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Add<f64, Output = Self>
    + Sub<f64, Output = Self>
    + Mul<f64, Output = Self>
    + Div<f64, Output = Self>
{
    /// Lift a numeric constant into this representation.
    fn constant(value: f64) -> Self;

    fn exp(&self) -> Self;
    fn ln(&self) -> Self;
    fn sin(&self) -> Self;
    fn cos(&self) -> Self;
    fn tan(&self) -> Self;
    fn sinh(&self) -> Self;
    fn cosh(&self) -> Self;
    fn tanh(&self) -> Self;
    fn asin(&self) -> Self;
    fn acos(&self) -> Self;
    fn atan(&self) -> Self;
    fn asinh(&self) -> Self;
    fn acosh(&self) -> Self;
    fn atanh(&self) -> Self;
    fn sqrt(&self) -> Self;
    fn abs(&self) -> Self;
    /// Sign of the value: -1, 0 or 1.
    fn sign(&self) -> Self;
    /// `exp(x) - 1`, accurate near zero.
    fn exp_m1(&self) -> Self;
    /// `ln(1 + x)`, accurate near zero.
    fn ln_1p(&self) -> Self;
    /// Gauss error function.
    fn erf(&self) -> Self;
    /// Raise to a constant power.
    fn powf(&self, exponent: f64) -> Self;
    /// Raise to a power that is itself a scalar of this type.
    fn pow(&self, exponent: &Self) -> Self;
}

/// Sign function with `sign(0) = 0`.
pub(crate) fn sign_f64(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

impl Scalar for f64 {
    fn constant(value: f64) -> Self {
        value
    }

    fn exp(&self) -> Self {
        f64::exp(*self)
    }

    fn ln(&self) -> Self {
        f64::ln(*self)
    }

    fn sin(&self) -> Self {
        f64::sin(*self)
    }

    fn cos(&self) -> Self {
        f64::cos(*self)
    }

    fn tan(&self) -> Self {
        f64::tan(*self)
    }

    fn sinh(&self) -> Self {
        f64::sinh(*self)
    }

    fn cosh(&self) -> Self {
        f64::cosh(*self)
    }

    fn tanh(&self) -> Self {
        f64::tanh(*self)
    }

    fn asin(&self) -> Self {
        f64::asin(*self)
    }

    fn acos(&self) -> Self {
        f64::acos(*self)
    }

    fn atan(&self) -> Self {
        f64::atan(*self)
    }

    fn asinh(&self) -> Self {
        f64::asinh(*self)
    }

    fn acosh(&self) -> Self {
        f64::acosh(*self)
    }

    fn atanh(&self) -> Self {
        f64::atanh(*self)
    }

    fn sqrt(&self) -> Self {
        f64::sqrt(*self)
    }

    fn abs(&self) -> Self {
        f64::abs(*self)
    }

    fn sign(&self) -> Self {
        sign_f64(*self)
    }

    fn exp_m1(&self) -> Self {
        f64::exp_m1(*self)
    }

    fn ln_1p(&self) -> Self {
        f64::ln_1p(*self)
    }

    fn erf(&self) -> Self {
        libm::erf(*self)
    }

    fn powf(&self, exponent: f64) -> Self {
        f64::powf(*self, exponent)
    }

    fn pow(&self, exponent: &Self) -> Self {
        f64::powf(*self, *exponent)
    }
}
