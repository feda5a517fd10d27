//! Evaluation and local derivatives of each operation.
//!
//! Both functions are generic over [`Scalar`], so the same rules serve numeric
//! evaluation (`f64`), forward-mode sweeps (`Dual`) and symbolic rewriting of a
//! tape into derivative expressions (`CGScalar`).

use crate::node::Op;
use crate::scalar::Scalar;

/// Local partial derivative of an operation with respect to one operand.
///
/// The unit cases are kept symbolic so that accumulation can skip a multiply
/// (and, for recorded scalars, avoid allocating trivial nodes).
#[derive(Debug, Clone)]
pub enum Partial<S> {
    Zero,
    One,
    MinusOne,
    Value(S),
}

impl<S: Scalar> Partial<S> {
    /// Chain rule: `adjoint * partial`, or `None` when the contribution is zero.
    pub fn scale(&self, adjoint: &S) -> Option<S> {
        match self {
            Partial::Zero => None,
            Partial::One => Some(adjoint.clone()),
            Partial::MinusOne => Some(-adjoint.clone()),
            Partial::Value(p) => Some(adjoint.clone() * p.clone()),
        }
    }
}

/// Evaluate `op` on its operands.
pub fn apply<S: Scalar>(op: Op, args: &[&S]) -> S {
    match op {
        Op::Const(v) | Op::Leaf(v) => S::constant(v),
        Op::Add => args[0].clone() + args[1].clone(),
        Op::Sub => args[0].clone() - args[1].clone(),
        Op::Mul => args[0].clone() * args[1].clone(),
        Op::Div => args[0].clone() / args[1].clone(),
        Op::Neg => -args[0].clone(),
        Op::Powf(exponent) => args[0].powf(exponent),
        Op::Pow => args[0].pow(args[1]),
        Op::Exp => args[0].exp(),
        Op::Ln => args[0].ln(),
        Op::Sin => args[0].sin(),
        Op::Cos => args[0].cos(),
        Op::Tan => args[0].tan(),
        Op::Sinh => args[0].sinh(),
        Op::Cosh => args[0].cosh(),
        Op::Tanh => args[0].tanh(),
        Op::Asin => args[0].asin(),
        Op::Acos => args[0].acos(),
        Op::Atan => args[0].atan(),
        Op::Asinh => args[0].asinh(),
        Op::Acosh => args[0].acosh(),
        Op::Atanh => args[0].atanh(),
        Op::Sqrt => args[0].sqrt(),
        Op::Abs => args[0].abs(),
        Op::Sign => args[0].sign(),
        Op::ExpM1 => args[0].exp_m1(),
        Op::Ln1p => args[0].ln_1p(),
        Op::Erf => args[0].erf(),
    }
}

/// Local partial derivatives d(result)/d(args[i]) for each operand.
///
/// `result` is the already computed value of `op(args)`, reused where the
/// derivative is expressed in terms of it.
pub fn partials<S: Scalar>(op: Op, args: &[&S], result: &S) -> Vec<Partial<S>> {
    let one = || S::constant(1.0);
    match op {
        Op::Const(_) | Op::Leaf(_) => vec![],

        Op::Add => vec![Partial::One, Partial::One],

        Op::Sub => vec![Partial::One, Partial::MinusOne],

        // z = a * b: dz/da = b, dz/db = a
        Op::Mul => vec![
            Partial::Value(args[1].clone()),
            Partial::Value(args[0].clone()),
        ],

        // z = a / b: dz/da = 1/b, dz/db = -z/b
        Op::Div => vec![
            Partial::Value(one() / args[1].clone()),
            Partial::Value(-(result.clone() / args[1].clone())),
        ],

        Op::Neg => vec![Partial::MinusOne],

        // z = a^c: dz/da = c a^(c-1)
        Op::Powf(exponent) => vec![Partial::Value(args[0].powf(exponent - 1.0) * exponent)],

        // z = a^b: dz/da = b a^(b-1), dz/db = z ln(a)
        Op::Pow => vec![
            Partial::Value(args[1].clone() * args[0].pow(&(args[1].clone() - 1.0))),
            Partial::Value(result.clone() * args[0].ln()),
        ],

        Op::Exp => vec![Partial::Value(result.clone())],

        Op::Ln => vec![Partial::Value(one() / args[0].clone())],

        Op::Sin => vec![Partial::Value(args[0].cos())],

        Op::Cos => vec![Partial::Value(-args[0].sin())],

        // d tan = 1 + tan^2
        Op::Tan => vec![Partial::Value(result.clone() * result.clone() + 1.0)],

        Op::Sinh => vec![Partial::Value(args[0].cosh())],

        Op::Cosh => vec![Partial::Value(args[0].sinh())],

        // d tanh = 1 - tanh^2
        Op::Tanh => vec![Partial::Value(one() - result.clone() * result.clone())],

        Op::Asin => vec![Partial::Value(
            one() / (one() - args[0].clone() * args[0].clone()).sqrt(),
        )],

        Op::Acos => vec![Partial::Value(
            -(one() / (one() - args[0].clone() * args[0].clone()).sqrt()),
        )],

        Op::Atan => vec![Partial::Value(
            one() / (args[0].clone() * args[0].clone() + 1.0),
        )],

        Op::Asinh => vec![Partial::Value(
            one() / (args[0].clone() * args[0].clone() + 1.0).sqrt(),
        )],

        Op::Acosh => vec![Partial::Value(
            one() / (args[0].clone() * args[0].clone() - 1.0).sqrt(),
        )],

        Op::Atanh => vec![Partial::Value(
            one() / (one() - args[0].clone() * args[0].clone()),
        )],

        // d sqrt = 1 / (2 sqrt)
        Op::Sqrt => vec![Partial::Value(one() / (result.clone() * 2.0))],

        Op::Abs => vec![Partial::Value(args[0].sign())],

        Op::Sign => vec![Partial::Zero],

        // d expm1 = exp = expm1 + 1
        Op::ExpM1 => vec![Partial::Value(result.clone() + 1.0)],

        Op::Ln1p => vec![Partial::Value(one() / (args[0].clone() + 1.0))],

        // d erf = 2/sqrt(pi) exp(-x^2)
        Op::Erf => vec![Partial::Value(
            (-(args[0].clone() * args[0].clone())).exp() * std::f64::consts::FRAC_2_SQRT_PI,
        )],
    }
}
