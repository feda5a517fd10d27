//! Integration tests for tracing and generated functions.
//!
//! Every test names its mode explicitly, so tests can run in parallel even
//! though the active mode is shared by the process.

use approx::assert_relative_eq;
use autogen::prelude::*;
use autogen::trace_in;

// ============================================================================
// Test Functions
// ============================================================================

struct Sum;

impl VectorFunction for Sum {
    fn eval<S: Scalar>(&self, x: &[S]) -> Vec<S> {
        vec![x[0].clone() + x[1].clone()]
    }
}

struct Square;

impl VectorFunction for Square {
    fn eval<S: Scalar>(&self, x: &[S]) -> Vec<S> {
        vec![x[0].clone() * x[0].clone()]
    }
}

/// A small chemical-kinetics style right-hand side with three states.
struct Kinetics {
    k1: f64,
    k2: f64,
}

impl VectorFunction for Kinetics {
    fn eval<S: Scalar>(&self, x: &[S]) -> Vec<S> {
        let r1 = x[0].clone() * self.k1;
        let r2 = x[1].clone() * x[2].clone() * self.k2;
        vec![
            -r1.clone(),
            r1.clone() - r2.clone(),
            r2 - x[2].exp() * 0.01,
        ]
    }
}

fn differentiable_modes() -> [Mode; 2] {
    [Mode::DualNumberAD, Mode::CodeGenAD]
}

// ============================================================================
// Tracing
// ============================================================================

#[test]
fn test_sum_scenario() {
    let graph = trace(&Sum, &[2.0, 3.0], Some(Mode::DualNumberAD)).unwrap();
    assert_eq!(graph.input_dim(), 2);
    assert_eq!(graph.output_dim(), 1);
    assert_eq!(graph.forward(&[2.0, 3.0]).unwrap(), vec![5.0]);
    assert_eq!(graph.jacobian(&[2.0, 3.0]).unwrap(), vec![vec![1.0, 1.0]]);
}

#[test]
fn test_square_scenario() {
    let graph = trace(&Square, &[4.0], Some(Mode::DualNumberAD)).unwrap();
    assert_eq!(graph.jacobian(&[4.0]).unwrap(), vec![vec![8.0]]);
}

#[test]
fn test_graph_reproduces_function_at_sample() {
    let f = Kinetics { k1: 0.04, k2: 3e7 };
    let samples = [[1.0, 0.0, 0.0], [0.9, 1e-5, 0.1], [0.2, 0.3, -0.4]];

    for mode in differentiable_modes() {
        for xs in &samples {
            let graph = trace_in(&f, xs, mode).unwrap();
            let expected = f.eval(&xs[..]);
            let got = graph.forward(xs).unwrap();
            for (e, g) in expected.iter().zip(got.iter()) {
                assert_relative_eq!(e, g, max_relative = 1e-12);
            }
        }
    }
}

#[test]
fn test_numerical_mode_never_traces() {
    for xs in [&[1.0][..], &[0.0, -2.0][..], &[3.0, 4.0, 5.0][..]] {
        assert!(matches!(
            trace_in(&Square, xs, Mode::Numerical),
            Err(Error::UnsupportedTraceMode { mode: Mode::Numerical })
        ));
    }
}

#[test]
fn test_graph_is_reusable_at_other_points() {
    let graph = trace_in(&Square, &[1.0], Mode::CodeGenAD).unwrap();
    for x in [-3.0, 0.0, 0.5, 10.0] {
        assert_eq!(graph.forward(&[x]).unwrap(), vec![x * x]);
        assert_eq!(graph.jacobian(&[x]).unwrap(), vec![vec![2.0 * x]]);
    }
}

// ============================================================================
// Generated Functions
// ============================================================================

#[test]
fn test_input_dim_is_sum_of_parts() {
    let mut f = GeneratedFunction::new(Kinetics { k1: 0.04, k2: 3e7 }, "kinetics");
    assert_eq!(f.input_dim(), f.global_input_dim() + f.local_input_dim());

    f.set_global_input_dim(2);
    assert_eq!(f.input_dim(), 2);
    f.trace(&[1.0, 0.0, 0.0]).unwrap();
    assert_eq!(f.local_input_dim(), 1);
    assert_eq!(f.input_dim(), f.global_input_dim() + f.local_input_dim());
    assert!(matches!(
        f.call(&[1.0, 0.0]),
        Err(Error::DimensionMismatch { expected: 3, actual: 2 })
    ));

    // Changing a dimension invalidates the trace
    f.set_local_input_dim(0);
    assert_eq!(f.input_dim(), 2);
    assert_eq!(f.input_dim(), f.global_input_dim() + f.local_input_dim());
    assert!(f.graph().is_none());
    assert_eq!(f.output_dim(), None);
    assert!(matches!(f.jacobian(&[1.0, 0.0, 0.0]), Err(Error::NoGraph { .. })));
}

#[test]
fn test_mode_change_clears_graph() {
    for (from, to) in [
        (Mode::DualNumberAD, Mode::CodeGenAD),
        (Mode::CodeGenAD, Mode::DualNumberAD),
        (Mode::CodeGenAD, Mode::Numerical),
    ] {
        let mut f = GeneratedFunction::new(Square, "square").with_mode(from).unwrap();
        f.trace(&[2.0]).unwrap();
        if from == Mode::CodeGenAD {
            f.compile().unwrap();
        }

        f.set_mode(to).unwrap();
        assert!(!f.is_compiled());
        assert!(f.graph().is_none());
        match to {
            Mode::Numerical => assert!(matches!(
                f.jacobian(&[2.0]),
                Err(Error::UnsupportedMode { .. })
            )),
            _ => assert!(matches!(f.jacobian(&[2.0]), Err(Error::NoGraph { .. }))),
        }
    }
}

#[test]
fn test_call_length_checked_once_established() {
    let mut f = GeneratedFunction::new(Sum, "sum");
    f.trace(&[2.0, 3.0]).unwrap();
    for bad in [&[1.0][..], &[1.0, 2.0, 3.0][..]] {
        assert!(matches!(
            f.call(bad),
            Err(Error::DimensionMismatch { expected: 2, .. })
        ));
    }
    assert_eq!(f.call(&[2.0, 3.0]).unwrap(), vec![5.0]);
}

#[test]
fn test_discard_library_falls_back_to_function() {
    let f_ref = Kinetics { k1: 0.04, k2: 3e7 };
    let x = [0.9, 1e-5, 0.1];
    let direct = f_ref.eval(&x[..]);

    let mut f = GeneratedFunction::new(f_ref, "kinetics")
        .with_mode(Mode::CodeGenAD)
        .unwrap();
    f.trace(&x).unwrap();
    f.compile().unwrap();
    let compiled = f.call(&x).unwrap();
    for (d, c) in direct.iter().zip(compiled.iter()) {
        assert_relative_eq!(d, c, max_relative = 1e-12);
    }

    f.discard_library();
    assert!(!f.is_compiled());
    assert_eq!(f.call(&x).unwrap(), direct);
}

#[test]
fn test_jacobian_before_trace() {
    let f = GeneratedFunction::new(Sum, "sum");
    assert!(matches!(f.jacobian(&[1.0, 2.0]), Err(Error::NoGraph { .. })));
    assert!(matches!(f.to_json(), Err(Error::NoGraph { .. })));
}

#[test]
fn test_compiled_library_source() {
    let mut f = GeneratedFunction::new(Square, "square")
        .with_mode(Mode::CodeGenAD)
        .unwrap();
    f.trace(&[3.0]).unwrap();
    f.compile().unwrap();

    let library = f.library().unwrap();
    assert_eq!(library.model_names(), vec!["square"]);
    let source = library.get_model("square").unwrap().source().unwrap();
    assert!(source.contains("pub fn square(x: &[f64], y: &mut [f64])"));
    assert!(source.contains("pub fn square_jacobian(x: &[f64], y: &mut [f64])"));
}

#[test]
fn test_json_export() {
    let mut f = GeneratedFunction::new(Sum, "sum");
    f.trace(&[2.0, 3.0]).unwrap();
    let json: serde_json::Value = serde_json::from_str(&f.to_json().unwrap()).unwrap();
    assert_eq!(json["num_inputs"], 2);
    assert_eq!(json["outputs"].as_array().unwrap().len(), 1);
}
