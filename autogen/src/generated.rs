//! Reusable handles around traced functions.

use autogen_codegen::{CompileOptions, Library};
use log::debug;

use crate::error::{Error, Result};
use crate::function::VectorFunction;
use crate::graph::ComputationalGraph;
use crate::mode::{resolve_backend, Mode};
use crate::trace::trace_in;

/// A user function together with its traced graph and compiled code.
///
/// The handle moves between three states:
///
/// | State | Graph | Compiled | Reached by |
/// |-------|-------|----------|------------|
/// | Untraced | no | no | [`new`](Self::new), [`discard_graph`](Self::discard_graph), [`set_mode`](Self::set_mode) |
/// | Traced | yes | no | [`trace`](Self::trace), [`discard_library`](Self::discard_library) |
/// | Compiled | yes | yes | [`compile`](Self::compile) |
///
/// Calls go through the compiled model when there is one and through the
/// plain function otherwise.
pub struct GeneratedFunction<F> {
    function: F,
    name: String,
    mode: Mode,
    options: CompileOptions,
    graph: Option<ComputationalGraph>,
    library: Option<Library>,
    global_input_dim: usize,
    local_input_dim: usize,
    output_dim: Option<usize>,
}

impl<F: VectorFunction> GeneratedFunction<F> {
    /// Wrap `function` in [`Mode::DualNumberAD`], untraced.
    pub fn new(function: F, name: impl Into<String>) -> Self {
        GeneratedFunction {
            function,
            name: name.into(),
            mode: Mode::DualNumberAD,
            options: CompileOptions::default(),
            graph: None,
            library: None,
            global_input_dim: 0,
            local_input_dim: 0,
            output_dim: None,
        }
    }

    /// Builder form of [`set_mode`](Self::set_mode).
    pub fn with_mode(mut self, mode: Mode) -> Result<Self> {
        self.set_mode(mode)?;
        Ok(self)
    }

    /// Options used by [`compile`](Self::compile).
    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Name of the function; also the name of its compiled model.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The mode used for tracing.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// The wrapped user function.
    pub fn function(&self) -> &F {
        &self.function
    }

    /// The traced graph, if any.
    pub fn graph(&self) -> Option<&ComputationalGraph> {
        self.graph.as_ref()
    }

    /// The library holding the compiled model, if compiled.
    pub fn library(&self) -> Option<&Library> {
        self.library.as_ref()
    }

    /// Whether a graph exists.
    pub fn is_traced(&self) -> bool {
        self.graph.is_some()
    }

    /// Whether calls run through compiled code.
    pub fn is_compiled(&self) -> bool {
        self.library.is_some()
    }

    /// Number of leading inputs shared across calls.
    pub fn global_input_dim(&self) -> usize {
        self.global_input_dim
    }

    /// Number of inputs after the global ones.
    pub fn local_input_dim(&self) -> usize {
        self.local_input_dim
    }

    /// Set the number of global inputs (leading inputs shared by every call).
    ///
    /// A different value invalidates the traced dimensions: the graph and
    /// compiled code are discarded and the function must be traced again.
    pub fn set_global_input_dim(&mut self, dim: usize) {
        if dim != self.global_input_dim {
            self.invalidate_dims();
            self.global_input_dim = dim;
        }
    }

    /// Set the number of local inputs. Invalidates like
    /// [`set_global_input_dim`](Self::set_global_input_dim).
    pub fn set_local_input_dim(&mut self, dim: usize) {
        if dim != self.local_input_dim {
            self.invalidate_dims();
            self.local_input_dim = dim;
        }
    }

    fn invalidate_dims(&mut self) {
        self.discard_graph();
        self.output_dim = None;
    }

    /// Total input length, `global_input_dim + local_input_dim`.
    pub fn input_dim(&self) -> usize {
        self.global_input_dim + self.local_input_dim
    }

    /// Output length, known once the function has been traced.
    pub fn output_dim(&self) -> Option<usize> {
        self.output_dim
    }

    /// Whether a trace has fixed the input and output dimensions.
    pub fn dims_established(&self) -> bool {
        self.output_dim.is_some()
    }

    fn check_input(&self, x: &[f64]) -> Result<()> {
        if !self.dims_established() {
            return Ok(());
        }
        let expected = self.input_dim();
        if x.len() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                actual: x.len(),
            });
        }
        Ok(())
    }

    /// Switch to `mode`. A different mode discards the graph and compiled code.
    ///
    /// Fails without changing anything if `mode` has no backend.
    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        resolve_backend(mode)?;
        if mode != self.mode {
            self.discard_graph();
            debug!("{}: mode {} -> {}", self.name, self.mode, mode);
            self.mode = mode;
        }
        Ok(())
    }

    /// Trace the function at `x` in this handle's mode, replacing any graph.
    ///
    /// The first trace fixes the dimensions: inputs beyond
    /// `global_input_dim` count as local inputs. Later traces must use the
    /// same input length.
    pub fn trace(&mut self, x: &[f64]) -> Result<&ComputationalGraph> {
        self.check_input(x)?;
        if x.len() < self.global_input_dim {
            return Err(Error::DimensionMismatch {
                expected: self.global_input_dim,
                actual: x.len(),
            });
        }

        let graph = trace_in(&self.function, x, self.mode)?;
        self.discard_library();
        self.local_input_dim = x.len() - self.global_input_dim;
        self.output_dim = Some(graph.output_dim());
        debug!(
            "{}: traced {} -> {} in {} mode",
            self.name,
            self.input_dim(),
            graph.output_dim(),
            self.mode
        );
        let graph: &ComputationalGraph = self.graph.insert(graph);
        Ok(graph)
    }

    /// Compile the traced graph. Requires [`Mode::CodeGenAD`].
    pub fn compile(&mut self) -> Result<()> {
        let graph = self.graph.as_ref().ok_or_else(|| Error::NoGraph {
            function: self.name.clone(),
        })?;
        let model = graph.compile(&self.name, &self.options)?;

        let mut library = Library::new(format!("{}_lib", self.name));
        library.add_model(model);
        self.library = Some(library);
        debug!("{}: compiled", self.name);
        Ok(())
    }

    /// Evaluate at `x`.
    pub fn call(&self, x: &[f64]) -> Result<Vec<f64>> {
        self.check_input(x)?;
        match &self.library {
            Some(library) => Ok(library.get_model(&self.name)?.eval(x)?),
            None => Ok(self.function.eval(x)),
        }
    }

    /// Jacobian at `x`, row-major `output_dim x input_dim`.
    pub fn jacobian(&self, x: &[f64]) -> Result<Vec<Vec<f64>>> {
        if !self.mode.is_differentiable() {
            return Err(Error::UnsupportedMode {
                mode: self.mode,
                operation: "jacobian",
            });
        }
        let graph = self.graph.as_ref().ok_or_else(|| Error::NoGraph {
            function: self.name.clone(),
        })?;
        self.check_input(x)?;

        if let Some(library) = &self.library {
            let model = library.get_model(&self.name)?;
            if model.has_jacobian() {
                return Ok(model.jacobian(x)?);
            }
        }
        graph.jacobian(x)
    }

    /// Directional derivative `J(x) v`.
    pub fn jvp(&self, x: &[f64], v: &[f64]) -> Result<Vec<f64>> {
        let graph = self.graph.as_ref().ok_or_else(|| Error::NoGraph {
            function: self.name.clone(),
        })?;
        self.check_input(x)?;
        graph.jvp(x, v)
    }

    /// The traced tape as JSON.
    pub fn to_json(&self) -> Result<String> {
        self.graph
            .as_ref()
            .ok_or_else(|| Error::NoGraph {
                function: self.name.clone(),
            })?
            .to_json()
    }

    /// Drop compiled code, keeping the graph. Does nothing if not compiled.
    pub fn discard_library(&mut self) {
        if self.library.take().is_some() {
            debug!("{}: discarded compiled library", self.name);
        }
    }

    /// Drop compiled code and the graph.
    pub fn discard_graph(&mut self) {
        self.discard_library();
        if self.graph.take().is_some() {
            debug!("{}: discarded graph", self.name);
        }
    }
}

impl<F> std::fmt::Debug for GeneratedFunction<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedFunction")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("input_dim", &(self.global_input_dim + self.local_input_dim))
            .field("output_dim", &self.output_dim)
            .field("traced", &self.graph.is_some())
            .field("compiled", &self.library.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use autogen_core::Scalar;

    struct Rosenbrock;

    impl VectorFunction for Rosenbrock {
        fn eval<S: Scalar>(&self, x: &[S]) -> Vec<S> {
            let a = S::constant(1.0) - x[0].clone();
            let b = x[1].clone() - x[0].clone() * x[0].clone();
            vec![a.clone() * a + b.clone() * b * 100.0]
        }
    }

    fn codegen() -> GeneratedFunction<Rosenbrock> {
        GeneratedFunction::new(Rosenbrock, "rosenbrock")
            .with_mode(Mode::CodeGenAD)
            .unwrap()
    }

    #[test]
    fn test_new_is_untraced() {
        let f = GeneratedFunction::new(Rosenbrock, "rosenbrock");
        assert_eq!(f.mode(), Mode::DualNumberAD);
        assert_eq!(f.input_dim(), 0);
        assert_eq!(f.output_dim(), None);
        assert!(!f.is_traced());
        assert!(!f.is_compiled());
        // Dimensions are unknown, so any length is accepted
        assert_eq!(f.call(&[1.0, 1.0]).unwrap(), vec![0.0]);
    }

    #[test]
    fn test_trace_sets_dimensions() {
        let mut f = GeneratedFunction::new(Rosenbrock, "rosenbrock");
        f.set_global_input_dim(1);
        assert!(!f.dims_established());
        f.trace(&[0.5, 0.5]).unwrap();

        assert!(f.dims_established());
        assert_eq!(f.global_input_dim(), 1);
        assert_eq!(f.local_input_dim(), 1);
        assert_eq!(f.input_dim(), 2);
        assert_eq!(f.output_dim(), Some(1));
    }

    struct Affine;

    impl VectorFunction for Affine {
        fn eval<S: Scalar>(&self, x: &[S]) -> Vec<S> {
            vec![x[0].clone() * x[2].clone() + x[1].clone()]
        }
    }

    #[test]
    fn test_inputs_beyond_global_are_local() {
        let mut f = GeneratedFunction::new(Affine, "affine");
        f.set_global_input_dim(2);
        f.trace(&[1.0, 2.0, 3.0]).unwrap();

        assert_eq!(f.global_input_dim(), 2);
        assert_eq!(f.local_input_dim(), 1);
        assert_eq!(f.input_dim(), 3);
        assert_eq!(f.jacobian(&[1.0, 2.0, 3.0]).unwrap(), vec![vec![3.0, 1.0, 1.0]]);
        assert!(matches!(
            f.call(&[1.0, 2.0]),
            Err(Error::DimensionMismatch { expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn test_trace_shorter_than_global_inputs() {
        let mut f = GeneratedFunction::new(Affine, "affine");
        f.set_global_input_dim(4);
        assert!(matches!(
            f.trace(&[1.0, 2.0, 3.0]),
            Err(Error::DimensionMismatch { expected: 4, actual: 3 })
        ));
        assert!(!f.is_traced());
        assert!(!f.dims_established());
    }

    #[test]
    fn test_dimension_change_discards_graph() {
        let mut f = codegen();
        f.trace(&[0.5, 0.5]).unwrap();
        f.compile().unwrap();

        // Same value keeps everything
        f.set_local_input_dim(2);
        assert!(f.is_compiled());

        f.set_local_input_dim(4);
        assert_eq!(f.input_dim(), 4);
        assert!(!f.is_traced());
        assert!(!f.is_compiled());
        assert!(!f.dims_established());
        assert!(matches!(f.jacobian(&[0.5, 0.5]), Err(Error::NoGraph { .. })));

        f.set_local_input_dim(0);
        f.set_global_input_dim(1);
        f.trace(&[0.5, 0.5]).unwrap();
        assert_eq!(f.local_input_dim(), 1);
        assert_eq!(f.input_dim(), f.global_input_dim() + f.local_input_dim());
    }

    #[test]
    fn test_compile_lifecycle() {
        let mut f = codegen();
        assert!(matches!(f.compile(), Err(Error::NoGraph { .. })));

        f.trace(&[0.0, 0.0]).unwrap();
        let x = [0.3, -0.4];
        let direct = f.call(&x).unwrap();
        let jac = f.jacobian(&x).unwrap();

        f.compile().unwrap();
        assert!(f.is_compiled());
        assert_relative_eq!(f.call(&x).unwrap()[0], direct[0], epsilon = 1e-12);
        let compiled_jac = f.jacobian(&x).unwrap();
        assert_relative_eq!(compiled_jac[0][0], jac[0][0], epsilon = 1e-10);
        assert_relative_eq!(compiled_jac[0][1], jac[0][1], epsilon = 1e-10);

        f.discard_library();
        assert!(!f.is_compiled());
        assert!(f.is_traced());
        assert_eq!(f.call(&x).unwrap(), direct);
        f.discard_library();
        assert!(!f.is_compiled());
    }

    #[test]
    fn test_compile_needs_codegen_mode() {
        let mut f = GeneratedFunction::new(Rosenbrock, "rosenbrock");
        f.trace(&[1.0, 2.0]).unwrap();
        assert!(matches!(
            f.compile(),
            Err(Error::UnsupportedMode {
                mode: Mode::DualNumberAD,
                ..
            })
        ));
        assert!(!f.is_compiled());
    }

    #[test]
    fn test_mode_change_invalidates() {
        let mut f = codegen();
        f.trace(&[0.0, 0.0]).unwrap();
        f.compile().unwrap();

        // Same mode keeps everything
        f.set_mode(Mode::CodeGenAD).unwrap();
        assert!(f.is_compiled());

        f.set_mode(Mode::DualNumberAD).unwrap();
        assert!(!f.is_compiled());
        assert!(!f.is_traced());
        assert!(matches!(f.jacobian(&[0.0, 0.0]), Err(Error::NoGraph { .. })));

        f.trace(&[0.0, 0.0]).unwrap();
        assert_relative_eq!(f.jacobian(&[0.0, 0.0]).unwrap()[0][0], -2.0);
    }

    #[test]
    fn test_gpu_mode_change_is_rejected_before_teardown() {
        let mut f = codegen();
        f.trace(&[0.0, 0.0]).unwrap();
        f.compile().unwrap();

        assert!(matches!(
            f.set_mode(Mode::GPU),
            Err(Error::UnsupportedMode { mode: Mode::GPU, .. })
        ));
        assert_eq!(f.mode(), Mode::CodeGenAD);
        assert!(f.is_compiled());
        assert!(f.is_traced());
    }

    #[test]
    fn test_numerical_mode() {
        let mut f = GeneratedFunction::new(Rosenbrock, "rosenbrock")
            .with_mode(Mode::Numerical)
            .unwrap();
        assert!(matches!(
            f.trace(&[1.0, 1.0]),
            Err(Error::UnsupportedTraceMode { mode: Mode::Numerical })
        ));
        assert!(!f.is_traced());
        assert!(matches!(
            f.jacobian(&[1.0, 1.0]),
            Err(Error::UnsupportedMode {
                mode: Mode::Numerical,
                operation: "jacobian"
            })
        ));
        assert_eq!(f.call(&[1.0, 1.0]).unwrap(), vec![0.0]);
    }

    #[test]
    fn test_call_dimension_mismatch() {
        let mut f = GeneratedFunction::new(Rosenbrock, "rosenbrock");
        f.trace(&[1.0, 1.0]).unwrap();
        assert!(matches!(
            f.call(&[1.0]),
            Err(Error::DimensionMismatch { expected: 2, actual: 1 })
        ));
        assert!(matches!(
            f.trace(&[1.0, 1.0, 1.0]),
            Err(Error::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_failed_trace_keeps_previous_graph() {
        let mut f = codegen();
        f.trace(&[0.0, 0.0]).unwrap();
        f.compile().unwrap();
        assert!(matches!(f.trace(&[0.0, f64::INFINITY]), Err(Error::InvalidInput(_))));
        assert!(f.is_traced());
        assert!(f.is_compiled());
    }

    #[test]
    fn test_options_are_used() {
        let mut f = codegen().with_options(CompileOptions::default().with_jacobian(false));
        f.trace(&[0.0, 0.0]).unwrap();
        f.compile().unwrap();
        let model = f.library().unwrap().get_model("rosenbrock").unwrap();
        assert!(!model.has_jacobian());
        // Falls back to the graph
        assert_relative_eq!(f.jacobian(&[0.0, 0.0]).unwrap()[0][0], -2.0);
    }
}
