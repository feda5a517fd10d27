//! Compilation settings.

use serde::{Deserialize, Serialize};

/// Controls what [`compile`](crate::compile) produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileOptions {
    /// Evaluate constant subexpressions at compile time and drop dead code.
    pub fold_constants: bool,
    /// Also compile a symbolic Jacobian program.
    pub jacobian: bool,
    /// Keep the generated Rust source alongside the compiled programs.
    pub emit_source: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            fold_constants: true,
            jacobian: true,
            emit_source: true,
        }
    }
}

impl CompileOptions {
    pub fn with_fold_constants(mut self, fold_constants: bool) -> Self {
        self.fold_constants = fold_constants;
        self
    }

    pub fn with_jacobian(mut self, jacobian: bool) -> Self {
        self.jacobian = jacobian;
        self
    }

    pub fn with_emit_source(mut self, emit_source: bool) -> Self {
        self.emit_source = emit_source;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let opts = CompileOptions::default()
            .with_jacobian(false)
            .with_emit_source(false);
        assert!(opts.fold_constants);
        assert!(!opts.jacobian);
        assert!(!opts.emit_source);
    }
}
