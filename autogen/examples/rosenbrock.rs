//! Demo: trace the Rosenbrock function in each mode, compare Jacobians
//! against finite differences, and run gradient descent on the
//! compiled model.
//!
//! Run with `cargo run -p autogen --example rosenbrock`.

use autogen::prelude::*;
use autogen_core::{finite_diff_jacobian, max_abs_error};

/// f(x, y) = [(1 - x)^2 + 100 (y - x^2)^2]
struct Rosenbrock;

impl VectorFunction for Rosenbrock {
    fn eval<S: Scalar>(&self, x: &[S]) -> Vec<S> {
        let a = S::constant(1.0) - x[0].clone();
        let b = x[1].clone() - x[0].clone() * x[0].clone();
        vec![a.clone() * a + b.clone() * b * 100.0]
    }
}

fn jacobian_in(mode: Mode, x: &[f64]) -> autogen::Result<Vec<Vec<f64>>> {
    let mut f = GeneratedFunction::new(Rosenbrock, "rosenbrock").with_mode(mode)?;
    f.trace(x)?;
    f.jacobian(x)
}

fn main() -> autogen::Result<()> {
    println!("=== Mode-Scoped Tracing Demo ===\n");

    let x0 = [-1.2, 1.0];
    let fd = finite_diff_jacobian(|v: &[f64]| Rosenbrock.eval(v), &x0, 1e-7);
    println!("Function:   f(x, y) = (1 - x)^2 + 100 (y - x^2)^2");
    println!("At point:   x = {}, y = {}", x0[0], x0[1]);
    println!("Value:      f = {:.10}", Rosenbrock.eval(&x0[..])[0]);
    println!("Finite differences: [{:.6}, {:.6}]\n", fd[0][0], fd[0][1]);

    for mode in Mode::ALL {
        match jacobian_in(mode, &x0) {
            Ok(jac) => println!(
                "{:<13} jacobian = [{:.6}, {:.6}]  |ad - fd| = {:.2e}",
                mode.to_string(),
                jac[0][0],
                jac[0][1],
                max_abs_error(&jac, &fd)
            ),
            Err(e) => println!("{:<13} {}", mode.to_string(), e),
        }
    }

    // Compile once, then iterate on the compiled model
    let mut f = GeneratedFunction::new(Rosenbrock, "rosenbrock").with_mode(Mode::CodeGenAD)?;
    f.trace(&x0)?;
    f.compile()?;

    let library = f.library().map(|lib| lib.model_names().join(", ")).unwrap_or_default();
    println!("\nCompiled models: {library}");
    if let Some(source) = f.library().and_then(|lib| lib.get_model("rosenbrock").ok()).and_then(|m| m.source()) {
        println!("Generated source: {} lines", source.lines().count());
    }

    let mut x = x0;
    let step = 2e-4;
    for iter in 0..=2000 {
        let grad = f.jacobian(&x)?;
        if iter % 500 == 0 {
            println!("iter {:>4}: f = {:.6e} at [{:.6}, {:.6}]", iter, f.call(&x)?[0], x[0], x[1]);
        }
        x[0] -= step * grad[0][0];
        x[1] -= step * grad[0][1];
    }

    f.discard_library();
    println!("\nAfter discard_library: compiled = {}, f = {:.6e}", f.is_compiled(), f.call(&x)?[0]);
    Ok(())
}
