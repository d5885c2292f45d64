use std::sync::Arc;

use crate::error::Result;
use crate::models::FeatureVector;

/// Port for a trained deflection predictor
pub trait DeflectionPredictor: Send + Sync {
    /// Predict midspan deflection in mm for the given features and load
    fn predict(&self, features: &FeatureVector, load_n: f64) -> Result<f64>;

    /// Get the name/identifier of the model
    fn model_name(&self) -> &str;
}

/// Result of trying to load the predictive model
#[derive(Clone)]
pub enum ModelAvailability {
    Available(Arc<dyn DeflectionPredictor>),
    Unavailable { reason: String },
}

impl ModelAvailability {
    pub fn is_available(&self) -> bool {
        matches!(self, ModelAvailability::Available(_))
    }
}

impl std::fmt::Debug for ModelAvailability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelAvailability::Available(model) => {
                f.debug_tuple("Available").field(&model.model_name()).finish()
            }
            ModelAvailability::Unavailable { reason } => {
                f.debug_struct("Unavailable").field("reason", reason).finish()
            }
        }
    }
}

/// Port for locating and loading the predictive model
pub trait ModelLoader: Send + Sync {
    /// Never fails: a missing or broken artifact is `Unavailable`
    fn load(&self) -> ModelAvailability;
}
