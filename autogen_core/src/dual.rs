//! Forward-mode dual numbers.
//!
//! A [`Dual`] carries a value `re` and a directional derivative `eps`. Running
//! a function on duals whose inputs are seeded with a unit tangent yields one
//! column of the Jacobian in a single pass.

use std::f64::consts::FRAC_2_SQRT_PI;
use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::scalar::{sign_f64, Scalar};

/// A first-order dual number `re + eps·ε` with `ε² = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dual {
    /// Value part.
    pub re: f64,
    /// Tangent (derivative) part.
    pub eps: f64,
}

impl Dual {
    pub fn new(re: f64, eps: f64) -> Self {
        Dual { re, eps }
    }

    /// A dual with unit tangent, i.e. the variable we differentiate with respect to.
    pub fn variable(re: f64) -> Self {
        Dual { re, eps: 1.0 }
    }

    /// Apply a unary function given its value and derivative at `re`.
    fn chain(&self, value: f64, derivative: f64) -> Self {
        Dual {
            re: value,
            eps: self.eps * derivative,
        }
    }
}

impl From<f64> for Dual {
    fn from(re: f64) -> Self {
        Dual { re, eps: 0.0 }
    }
}

impl Add for Dual {
    type Output = Dual;

    fn add(self, rhs: Dual) -> Dual {
        Dual::new(self.re + rhs.re, self.eps + rhs.eps)
    }
}

impl Sub for Dual {
    type Output = Dual;

    fn sub(self, rhs: Dual) -> Dual {
        Dual::new(self.re - rhs.re, self.eps - rhs.eps)
    }
}

impl Mul for Dual {
    type Output = Dual;

    fn mul(self, rhs: Dual) -> Dual {
        Dual::new(self.re * rhs.re, self.eps * rhs.re + self.re * rhs.eps)
    }
}

impl Div for Dual {
    type Output = Dual;

    fn div(self, rhs: Dual) -> Dual {
        let re = self.re / rhs.re;
        Dual::new(re, (self.eps - re * rhs.eps) / rhs.re)
    }
}

impl Neg for Dual {
    type Output = Dual;

    fn neg(self) -> Dual {
        Dual::new(-self.re, -self.eps)
    }
}

impl Add<f64> for Dual {
    type Output = Dual;

    fn add(self, rhs: f64) -> Dual {
        Dual::new(self.re + rhs, self.eps)
    }
}

impl Sub<f64> for Dual {
    type Output = Dual;

    fn sub(self, rhs: f64) -> Dual {
        Dual::new(self.re - rhs, self.eps)
    }
}

impl Mul<f64> for Dual {
    type Output = Dual;

    fn mul(self, rhs: f64) -> Dual {
        Dual::new(self.re * rhs, self.eps * rhs)
    }
}

impl Div<f64> for Dual {
    type Output = Dual;

    fn div(self, rhs: f64) -> Dual {
        Dual::new(self.re / rhs, self.eps / rhs)
    }
}

impl Add<Dual> for f64 {
    type Output = Dual;

    fn add(self, rhs: Dual) -> Dual {
        Dual::from(self) + rhs
    }
}

impl Sub<Dual> for f64 {
    type Output = Dual;

    fn sub(self, rhs: Dual) -> Dual {
        Dual::from(self) - rhs
    }
}

impl Mul<Dual> for f64 {
    type Output = Dual;

    fn mul(self, rhs: Dual) -> Dual {
        rhs * self
    }
}

impl Div<Dual> for f64 {
    type Output = Dual;

    fn div(self, rhs: Dual) -> Dual {
        Dual::from(self) / rhs
    }
}

impl Scalar for Dual {
    fn constant(value: f64) -> Self {
        Dual::from(value)
    }

    fn exp(&self) -> Self {
        let e = self.re.exp();
        self.chain(e, e)
    }

    fn ln(&self) -> Self {
        self.chain(self.re.ln(), 1.0 / self.re)
    }

    fn sin(&self) -> Self {
        self.chain(self.re.sin(), self.re.cos())
    }

    fn cos(&self) -> Self {
        self.chain(self.re.cos(), -self.re.sin())
    }

    fn tan(&self) -> Self {
        let t = self.re.tan();
        self.chain(t, 1.0 + t * t)
    }

    fn sinh(&self) -> Self {
        self.chain(self.re.sinh(), self.re.cosh())
    }

    fn cosh(&self) -> Self {
        self.chain(self.re.cosh(), self.re.sinh())
    }

    fn tanh(&self) -> Self {
        let t = self.re.tanh();
        self.chain(t, 1.0 - t * t)
    }

    fn asin(&self) -> Self {
        self.chain(self.re.asin(), 1.0 / (1.0 - self.re * self.re).sqrt())
    }

    fn acos(&self) -> Self {
        self.chain(self.re.acos(), -1.0 / (1.0 - self.re * self.re).sqrt())
    }

    fn atan(&self) -> Self {
        self.chain(self.re.atan(), 1.0 / (1.0 + self.re * self.re))
    }

    fn asinh(&self) -> Self {
        self.chain(self.re.asinh(), 1.0 / (self.re * self.re + 1.0).sqrt())
    }

    fn acosh(&self) -> Self {
        self.chain(self.re.acosh(), 1.0 / (self.re * self.re - 1.0).sqrt())
    }

    fn atanh(&self) -> Self {
        self.chain(self.re.atanh(), 1.0 / (1.0 - self.re * self.re))
    }

    fn sqrt(&self) -> Self {
        let s = self.re.sqrt();
        self.chain(s, 0.5 / s)
    }

    fn abs(&self) -> Self {
        self.chain(self.re.abs(), sign_f64(self.re))
    }

    fn sign(&self) -> Self {
        self.chain(sign_f64(self.re), 0.0)
    }

    fn exp_m1(&self) -> Self {
        self.chain(self.re.exp_m1(), self.re.exp())
    }

    fn ln_1p(&self) -> Self {
        self.chain(self.re.ln_1p(), 1.0 / (1.0 + self.re))
    }

    fn erf(&self) -> Self {
        self.chain(libm::erf(self.re), FRAC_2_SQRT_PI * (-self.re * self.re).exp())
    }

    fn powf(&self, exponent: f64) -> Self {
        self.chain(
            self.re.powf(exponent),
            exponent * self.re.powf(exponent - 1.0),
        )
    }

    fn pow(&self, exponent: &Self) -> Self {
        // d(a^b) = b a^(b-1) da + a^b ln(a) db
        let value = self.re.powf(exponent.re);
        let mut eps = exponent.re * self.re.powf(exponent.re - 1.0) * self.eps;
        if exponent.eps != 0.0 {
            eps += value * self.re.ln() * exponent.eps;
        }
        Dual::new(value, eps)
    }
}
