//! Compiled models and the named library that owns them.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::CodegenError;
use crate::program::Program;

/// A function compiled from one tape, with its optional Jacobian program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledModel {
    pub(crate) name: String,
    pub(crate) function: Program,
    pub(crate) jacobian: Option<Program>,
    pub(crate) source: Option<String>,
}

impl CompiledModel {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of inputs.
    pub fn input_dim(&self) -> usize {
        self.function.num_inputs()
    }

    /// Number of outputs.
    pub fn output_dim(&self) -> usize {
        self.function.num_outputs()
    }

    /// Program computing the function values.
    pub fn function(&self) -> &Program {
        &self.function
    }

    pub fn has_jacobian(&self) -> bool {
        self.jacobian.is_some()
    }

    /// Generated Rust source for the function and Jacobian, if it was emitted.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Evaluate the compiled function.
    pub fn eval(&self, x: &[f64]) -> Result<Vec<f64>, CodegenError> {
        Ok(self.function.eval(x)?)
    }

    /// Evaluate the compiled Jacobian as a row-major `output_dim x input_dim` matrix.
    pub fn jacobian(&self, x: &[f64]) -> Result<Vec<Vec<f64>>, CodegenError> {
        let program = self
            .jacobian
            .as_ref()
            .ok_or_else(|| CodegenError::MissingJacobian {
                model: self.name.clone(),
            })?;
        let flat = program.eval(x)?;
        let n = self.input_dim();
        if n == 0 {
            return Ok(vec![Vec::new(); self.output_dim()]);
        }
        Ok(flat.chunks(n).map(<[f64]>::to_vec).collect())
    }
}

/// A named collection of compiled models.
#[derive(Debug, Default)]
pub struct Library {
    name: String,
    models: BTreeMap<String, CompiledModel>,
}

impl Library {
    /// Create an empty library.
    pub fn new(name: impl Into<String>) -> Self {
        Library {
            name: name.into(),
            models: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a model, replacing any previous model with the same name.
    pub fn add_model(&mut self, model: CompiledModel) -> Option<CompiledModel> {
        debug!("library `{}`: adding model `{}`", self.name, model.name);
        self.models.insert(model.name.clone(), model)
    }

    /// Look up a model by name.
    pub fn get_model(&self, name: &str) -> Result<&CompiledModel, CodegenError> {
        self.models.get(name).ok_or_else(|| CodegenError::UnknownModel {
            name: name.to_string(),
        })
    }

    pub fn has_model(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Model names in sorted order.
    pub fn model_names(&self) -> Vec<&str> {
        self.models.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn clear(&mut self) {
        self.models.clear();
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        if !self.models.is_empty() {
            debug!(
                "library `{}`: releasing {} compiled model(s)",
                self.name,
                self.models.len()
            );
        }
    }
}
