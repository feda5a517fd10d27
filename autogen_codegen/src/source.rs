//! Rust source emission for register programs.

use std::fmt::Write;

use autogen_core::Op;

use crate::program::{Instruction, Program};

fn register(program: &Program, r: usize) -> String {
    if r < program.num_inputs() {
        format!("x[{r}]")
    } else {
        format!("v{r}")
    }
}

fn literal(value: f64) -> String {
    if value.is_nan() {
        "f64::NAN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "f64::INFINITY" } else { "f64::NEG_INFINITY" }.to_string()
    } else {
        format!("{value:?}_f64")
    }
}

fn unary(op: Op, a: &str) -> String {
    match op {
        Op::Neg => format!("-{a}"),
        Op::Powf(exponent) => format!("{a}.powf({})", literal(exponent)),
        Op::Erf => format!("libm::erf({a})"),
        Op::Sign => format!("if {a} > 0.0 {{ 1.0 }} else if {a} < 0.0 {{ -1.0 }} else {{ 0.0 }}"),
        other => format!("{a}.{}()", other.name()),
    }
}

fn binary(op: Op, a: &str, b: &str) -> String {
    match op {
        Op::Add => format!("{a} + {b}"),
        Op::Sub => format!("{a} - {b}"),
        Op::Mul => format!("{a} * {b}"),
        Op::Div => format!("{a} / {b}"),
        Op::Pow => format!("{a}.powf({b})"),
        other => format!("{}({a}, {b})", other.name()),
    }
}

/// Render `program` as a standalone Rust function named `name`.
///
/// The generated function has the signature
/// `pub fn name(x: &[f64], y: &mut [f64])` and writes one value per output.
pub fn emit_rust(name: &str, program: &Program) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = writeln!(out, "#[allow(unused_variables, clippy::all)]");
    let _ = writeln!(out, "pub fn {name}(x: &[f64], y: &mut [f64]) {{");
    let _ = writeln!(out, "    assert_eq!(x.len(), {});", program.num_inputs());
    let _ = writeln!(out, "    assert_eq!(y.len(), {});", program.num_outputs());

    for instr in program.code() {
        let rhs = match *instr {
            Instruction::Load { value, .. } => literal(value),
            Instruction::Unary { op, src, .. } => unary(op, &register(program, src)),
            Instruction::Binary { op, lhs, rhs, .. } => {
                binary(op, &register(program, lhs), &register(program, rhs))
            }
        };
        let _ = writeln!(out, "    let v{}: f64 = {rhs};", instr.dst());
    }

    for (i, &o) in program.outputs().iter().enumerate() {
        let _ = writeln!(out, "    y[{i}] = {};", register(program, o));
    }
    out.push_str("}\n");
    out
}
