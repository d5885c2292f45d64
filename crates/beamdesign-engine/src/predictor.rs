//! Trained deflection model loaded from a JSON artifact.
//!
//! ```json
//! {
//!   "name": "deflection-linear-v3",
//!   "intercept": 0.4,
//!   "weights": [0.0, 0.0, ...14 values],
//!   "reference_load_n": 10000.0
//! }
//! ```
//!
//! The prediction is made at `reference_load_n` and scaled linearly to the
//! design load. Without a reference load the raw prediction is used.

use beamdesign_core::error::{BeamdesignError, Result};
use beamdesign_core::models::{FeatureVector, FEATURE_COUNT};
use beamdesign_core::ports::{DeflectionPredictor, ModelAvailability, ModelLoader};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Linear regression over the engineered feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearDeflectionModel {
    pub name: String,
    pub intercept: f64,
    pub weights: Vec<f64>,
    #[serde(default)]
    pub reference_load_n: Option<f64>,
}

impl LinearDeflectionModel {
    pub fn from_json(json: &str) -> Result<Self> {
        let model: Self = serde_json::from_str(json)
            .map_err(|e| BeamdesignError::Serialization(format!("model artifact: {}", e)))?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<()> {
        if self.weights.len() != FEATURE_COUNT {
            return Err(BeamdesignError::model_unavailable(format!(
                "expected {} weights, found {}",
                FEATURE_COUNT,
                self.weights.len()
            )));
        }
        if !self.intercept.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(BeamdesignError::model_unavailable("non-finite coefficients"));
        }
        if let Some(load) = self.reference_load_n {
            if !load.is_finite() || load <= 0.0 {
                return Err(BeamdesignError::model_unavailable(
                    "reference_load_n must be positive",
                ));
            }
        }
        Ok(())
    }
}

impl DeflectionPredictor for LinearDeflectionModel {
    fn predict(&self, features: &FeatureVector, load_n: f64) -> Result<f64> {
        if !features.is_finite() {
            return Err(BeamdesignError::model_unavailable("non-finite features"));
        }

        let raw = self.intercept
            + self
                .weights
                .iter()
                .zip(features.values())
                .map(|(w, x)| w * x)
                .sum::<f64>();
        let scaled = match self.reference_load_n {
            Some(reference) => raw * load_n / reference,
            None => raw,
        };

        if !scaled.is_finite() || scaled < 0.0 {
            return Err(BeamdesignError::model_unavailable(format!(
                "model '{}' produced an unusable prediction ({})",
                self.name, scaled
            )));
        }
        Ok(scaled)
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

/// Loads a [`LinearDeflectionModel`] from an optional path
#[derive(Debug, Clone, Default)]
pub struct JsonModelLoader {
    path: Option<PathBuf>,
}

impl JsonModelLoader {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    fn load_from(path: &Path) -> Result<LinearDeflectionModel> {
        let json = fs::read_to_string(path)
            .map_err(|e| BeamdesignError::model_unavailable(format!("{}: {}", path.display(), e)))?;
        LinearDeflectionModel::from_json(&json)
    }
}

impl ModelLoader for JsonModelLoader {
    fn load(&self) -> ModelAvailability {
        let Some(path) = &self.path else {
            return ModelAvailability::Unavailable {
                reason: "no model path configured".to_string(),
            };
        };

        match Self::load_from(path) {
            Ok(model) => {
                tracing::info!(path = %path.display(), model = %model.name, "Loaded deflection model");
                ModelAvailability::Available(Arc::new(model))
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "Deflection model unavailable, using physics: {}", e);
                ModelAvailability::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }
}
