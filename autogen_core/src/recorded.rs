//! Scalar handles that record their arithmetic into the DAG.
//!
//! - [`ADScalar`] is the dual-number AD handle: it evaluates eagerly, so its
//!   value is always known, and records every operation it takes part in.
//! - [`CGScalar`] is the code-generation handle: purely symbolic, it only
//!   records. Tapes built from it are compiled rather than interpreted.

use crate::node::{Expr, Op};
use crate::ops::apply;
use crate::scalar::Scalar;

/// A scalar type whose values are nodes of the recorded DAG.
pub trait Recorded: Scalar {
    /// Create a fresh leaf holding `value`, ready to be marked independent.
    fn leaf(value: f64) -> Self;

    /// The node this scalar refers to.
    fn expr(&self) -> &Expr;
}

/// Recorded scalar that also carries its numeric value.
#[derive(Debug, Clone)]
pub struct ADScalar {
    expr: Expr,
    value: f64,
}

impl ADScalar {
    pub fn new(value: f64) -> Self {
        ADScalar {
            expr: Expr::leaf(value),
            value,
        }
    }

    /// The value computed while recording.
    pub fn value(&self) -> f64 {
        self.value
    }

    fn lift(value: f64) -> Self {
        ADScalar {
            expr: Expr::constant(value),
            value,
        }
    }

    fn unary(&self, op: Op) -> Self {
        ADScalar {
            expr: Expr::apply(op, vec![self.expr.clone()]),
            value: apply::<f64>(op, &[&self.value]),
        }
    }

    fn binary(&self, op: Op, rhs: &Self) -> Self {
        ADScalar {
            expr: Expr::apply(op, vec![self.expr.clone(), rhs.expr.clone()]),
            value: apply::<f64>(op, &[&self.value, &rhs.value]),
        }
    }
}

impl Recorded for ADScalar {
    fn leaf(value: f64) -> Self {
        ADScalar::new(value)
    }

    fn expr(&self) -> &Expr {
        &self.expr
    }
}

/// Purely symbolic recorded scalar.
#[derive(Debug, Clone)]
pub struct CGScalar(Expr);

impl CGScalar {
    pub fn new(value: f64) -> Self {
        CGScalar(Expr::leaf(value))
    }

    /// Wrap an existing node.
    pub fn from_expr(expr: Expr) -> Self {
        CGScalar(expr)
    }

    pub fn into_expr(self) -> Expr {
        self.0
    }

    fn lift(value: f64) -> Self {
        CGScalar(Expr::constant(value))
    }

    fn unary(&self, op: Op) -> Self {
        CGScalar(Expr::apply(op, vec![self.0.clone()]))
    }

    fn binary(&self, op: Op, rhs: &Self) -> Self {
        CGScalar(Expr::apply(op, vec![self.0.clone(), rhs.0.clone()]))
    }
}

impl Recorded for CGScalar {
    fn leaf(value: f64) -> Self {
        CGScalar::new(value)
    }

    fn expr(&self) -> &Expr {
        &self.0
    }
}

// === Operator overloads ===

macro_rules! recorded_binary_op {
    ($ty:ty, $trait:ident, $method:ident, $op:expr) => {
        impl std::ops::$trait for $ty {
            type Output = $ty;

            fn $method(self, rhs: $ty) -> $ty {
                self.binary($op, &rhs)
            }
        }

        impl std::ops::$trait<&$ty> for &$ty {
            type Output = $ty;

            fn $method(self, rhs: &$ty) -> $ty {
                self.binary($op, rhs)
            }
        }

        impl std::ops::$trait<f64> for $ty {
            type Output = $ty;

            fn $method(self, rhs: f64) -> $ty {
                self.binary($op, &<$ty>::lift(rhs))
            }
        }

        impl std::ops::$trait<$ty> for f64 {
            type Output = $ty;

            fn $method(self, rhs: $ty) -> $ty {
                <$ty>::lift(self).binary($op, &rhs)
            }
        }
    };
}

macro_rules! recorded_scalar {
    ($ty:ty) => {
        recorded_binary_op!($ty, Add, add, Op::Add);
        recorded_binary_op!($ty, Sub, sub, Op::Sub);
        recorded_binary_op!($ty, Mul, mul, Op::Mul);
        recorded_binary_op!($ty, Div, div, Op::Div);

        impl std::ops::Neg for $ty {
            type Output = $ty;

            fn neg(self) -> $ty {
                self.unary(Op::Neg)
            }
        }

        impl std::ops::Neg for &$ty {
            type Output = $ty;

            fn neg(self) -> $ty {
                self.unary(Op::Neg)
            }
        }

        impl Scalar for $ty {
            fn constant(value: f64) -> Self {
                <$ty>::lift(value)
            }

            fn exp(&self) -> Self {
                self.unary(Op::Exp)
            }

            fn ln(&self) -> Self {
                self.unary(Op::Ln)
            }

            fn sin(&self) -> Self {
                self.unary(Op::Sin)
            }

            fn cos(&self) -> Self {
                self.unary(Op::Cos)
            }

            fn tan(&self) -> Self {
                self.unary(Op::Tan)
            }

            fn sinh(&self) -> Self {
                self.unary(Op::Sinh)
            }

            fn cosh(&self) -> Self {
                self.unary(Op::Cosh)
            }

            fn tanh(&self) -> Self {
                self.unary(Op::Tanh)
            }

            fn asin(&self) -> Self {
                self.unary(Op::Asin)
            }

            fn acos(&self) -> Self {
                self.unary(Op::Acos)
            }

            fn atan(&self) -> Self {
                self.unary(Op::Atan)
            }

            fn asinh(&self) -> Self {
                self.unary(Op::Asinh)
            }

            fn acosh(&self) -> Self {
                self.unary(Op::Acosh)
            }

            fn atanh(&self) -> Self {
                self.unary(Op::Atanh)
            }

            fn sqrt(&self) -> Self {
                self.unary(Op::Sqrt)
            }

            fn abs(&self) -> Self {
                self.unary(Op::Abs)
            }

            fn sign(&self) -> Self {
                self.unary(Op::Sign)
            }

            fn exp_m1(&self) -> Self {
                self.unary(Op::ExpM1)
            }

            fn ln_1p(&self) -> Self {
                self.unary(Op::Ln1p)
            }

            fn erf(&self) -> Self {
                self.unary(Op::Erf)
            }

            fn powf(&self, exponent: f64) -> Self {
                self.unary(Op::Powf(exponent))
            }

            fn pow(&self, exponent: &Self) -> Self {
                self.binary(Op::Pow, exponent)
            }
        }
    };
}

recorded_scalar!(ADScalar);
recorded_scalar!(CGScalar);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ad_scalar_tracks_value() {
        let x = ADScalar::new(2.0);
        let y = ADScalar::new(3.0);

        let z = &x * &y + x.sin();
        assert!((z.value() - (6.0 + 2.0_f64.sin())).abs() < 1e-12);
        assert_eq!(z.expr().op(), &Op::Add);

        let w = 2.0 * x.clone() - 1.0;
        assert_eq!(w.value(), 3.0);
        assert_eq!((-&y).value(), -3.0);
    }

    #[test]
    fn test_cg_scalar_records_structure() {
        let x = CGScalar::new(1.0);
        let z = x.powf(2.0) / 4.0;

        assert_eq!(z.expr().op(), &Op::Div);
        let children = z.expr().children();
        assert_eq!(children[0].op(), &Op::Powf(2.0));
        assert_eq!(children[1].literal(), Some(4.0));
        assert_eq!(children[0].children()[0].id(), x.expr().id());
    }

    #[test]
    fn test_constants_are_not_leaves() {
        let c = <ADScalar as Scalar>::constant(1.5);
        assert!(!c.expr().is_leaf());
        assert!(ADScalar::leaf(1.5).expr().is_leaf());
    }
}
