//! # autogen_codegen - Compilation of recorded tapes
//!
//! Turns a [`Tape`] recorded by `autogen_core` into a [`CompiledModel`]: a
//! register [`Program`] for the function, an optional program for its
//! symbolic Jacobian, and optionally the equivalent Rust source text.
//!
//! ```
//! use autogen_codegen::{compile, CompileOptions};
//! use autogen_core::{CGScalar, Recorded, Scalar, Tape, TapeId};
//!
//! let id = TapeId::next();
//! let x = CGScalar::leaf(0.0);
//! x.expr().mark_independent(id, 0).unwrap();
//! let y = x.sin() * 2.0;
//! let tape = Tape::record(id, &[x.expr().clone()], &[y.expr().clone()]).unwrap();
//!
//! let model = compile("twice_sin", &tape, &CompileOptions::default()).unwrap();
//! assert!((model.eval(&[0.5]).unwrap()[0] - 2.0 * 0.5_f64.sin()).abs() < 1e-12);
//! assert!((model.jacobian(&[0.5]).unwrap()[0][0] - 2.0 * 0.5_f64.cos()).abs() < 1e-12);
//! ```

use autogen_core::{CGScalar, Expr, Recorded, Tape, TapeId};
use log::debug;

mod error;
mod library;
mod options;
mod program;
mod source;

pub use error::CodegenError;
pub use library::{CompiledModel, Library};
pub use options::CompileOptions;
pub use program::{Instruction, Program};
pub use source::emit_rust;

/// Record the symbolic Jacobian of `tape` as a tape of its own.
///
/// The result has the same inputs and `num_outputs * num_inputs` outputs,
/// flattened row-major.
pub fn jacobian_tape(tape: &Tape) -> Result<Tape, CodegenError> {
    let id = TapeId::next();
    let x: Vec<CGScalar> = (0..tape.num_inputs()).map(|_| CGScalar::leaf(0.0)).collect();
    for (i, xi) in x.iter().enumerate() {
        xi.expr().mark_independent(id, i)?;
    }

    let rows = tape.reverse_jacobian(&x)?;
    let xs: Vec<Expr> = x.iter().map(|s| s.expr().clone()).collect();
    let flat: Vec<Expr> = rows.into_iter().flatten().map(CGScalar::into_expr).collect();
    Ok(Tape::record(id, &xs, &flat)?)
}

/// Compile `tape` into a model called `name`.
pub fn compile(name: &str, tape: &Tape, options: &CompileOptions) -> Result<CompiledModel, CodegenError> {
    let function = Program::from_tape(tape, options.fold_constants);
    let jacobian = if options.jacobian {
        let jac = jacobian_tape(tape)?;
        Some(Program::from_tape(&jac, options.fold_constants))
    } else {
        None
    };

    let source = options.emit_source.then(|| {
        let mut src = emit_rust(name, &function);
        if let Some(jac) = &jacobian {
            src.push('\n');
            src.push_str(&emit_rust(&format!("{name}_jacobian"), jac));
        }
        src
    });

    debug!(
        "compiled `{}`: {} inputs, {} outputs, {} instructions{}",
        name,
        function.num_inputs(),
        function.num_outputs(),
        function.code().len(),
        match &jacobian {
            Some(j) => format!(", jacobian {} instructions", j.code().len()),
            None => String::new(),
        }
    );

    Ok(CompiledModel {
        name: name.to_string(),
        function,
        jacobian,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use autogen_core::Scalar;

    fn rosenbrock<S: Scalar>(x: &[S]) -> Vec<S> {
        let a = S::constant(1.0) - x[0].clone();
        let b = x[1].clone() - x[0].powf(2.0);
        vec![a.clone() * a + b.clone() * b * 100.0]
    }

    fn tape_of(n: usize, f: fn(&[CGScalar]) -> Vec<CGScalar>) -> Tape {
        let id = TapeId::next();
        let x: Vec<CGScalar> = (0..n).map(|_| CGScalar::leaf(0.0)).collect();
        for (i, xi) in x.iter().enumerate() {
            xi.expr().mark_independent(id, i).unwrap();
        }
        let y = f(&x);
        let xs: Vec<Expr> = x.iter().map(|s| s.expr().clone()).collect();
        let ys: Vec<Expr> = y.into_iter().map(CGScalar::into_expr).collect();
        Tape::record(id, &xs, &ys).unwrap()
    }

    #[test]
    fn test_compiled_rosenbrock() {
        let tape = tape_of(2, rosenbrock::<CGScalar>);
        let model = compile("rosenbrock", &tape, &CompileOptions::default()).unwrap();

        assert_eq!(model.input_dim(), 2);
        assert_eq!(model.output_dim(), 1);
        assert_relative_eq!(model.eval(&[1.0, 1.0]).unwrap()[0], 0.0);
        assert_relative_eq!(model.eval(&[0.0, 0.0]).unwrap()[0], 1.0);

        // grad = [-2(1-x) - 400x(y-x^2), 200(y-x^2)]
        let (x, y) = (0.5_f64, -0.25_f64);
        let jac = model.jacobian(&[x, y]).unwrap();
        assert_relative_eq!(jac[0][0], -2.0 * (1.0 - x) - 400.0 * x * (y - x * x), epsilon = 1e-10);
        assert_relative_eq!(jac[0][1], 200.0 * (y - x * x), epsilon = 1e-10);
    }

    #[test]
    fn test_compiled_matches_interpreted_reverse() {
        fn f<S: Scalar>(x: &[S]) -> Vec<S> {
            vec![
                x[0].exp() * x[1].cos(),
                (x[0].clone() * x[2].clone()).tanh(),
                x[2].sqrt() / (x[1].clone() + 3.0),
            ]
        }
        let tape = tape_of(3, f::<CGScalar>);
        let model = compile("f", &tape, &CompileOptions::default()).unwrap();

        let point = [0.3, -0.7, 1.9];
        let interpreted = tape.reverse_jacobian(&point).unwrap();
        let compiled = model.jacobian(&point).unwrap();
        for (ri, rc) in interpreted.iter().zip(compiled.iter()) {
            for (a, b) in ri.iter().zip(rc.iter()) {
                assert_relative_eq!(a, b, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_source_contains_both_functions() {
        let tape = tape_of(2, rosenbrock::<CGScalar>);
        let model = compile("rb", &tape, &CompileOptions::default()).unwrap();
        let src = model.source().unwrap();
        assert!(src.contains("pub fn rb(x: &[f64], y: &mut [f64])"));
        assert!(src.contains("pub fn rb_jacobian(x: &[f64], y: &mut [f64])"));

        let bare = compile("rb", &tape, &CompileOptions::default().with_emit_source(false)).unwrap();
        assert!(bare.source().is_none());
    }

    #[test]
    fn test_output_independent_of_inputs() {
        fn f<S: Scalar>(_x: &[S]) -> Vec<S> {
            vec![S::constant(4.0)]
        }
        let tape = tape_of(2, f::<CGScalar>);
        let model = compile("c", &tape, &CompileOptions::default()).unwrap();
        assert_eq!(model.eval(&[1.0, 2.0]).unwrap(), vec![4.0]);
        assert_eq!(model.jacobian(&[1.0, 2.0]).unwrap(), vec![vec![0.0, 0.0]]);
    }
}
