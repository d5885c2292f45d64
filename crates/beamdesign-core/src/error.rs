//! Error types for Beamdesign

use std::path::PathBuf;
use thiserror::Error;

use crate::models::{OptimizationFailure, Phase};

#[derive(Debug, Error)]
pub enum BeamdesignError {
    // Specification errors
    #[error("Invalid value for {field}: {reason}")]
    Validation { field: String, reason: String },

    // Corpus and static table errors
    #[error("Resource unavailable at {path}: {reason}")]
    Resource { path: PathBuf, reason: String },

    // Predictive model errors
    #[error("Deflection model unavailable: {reason}")]
    ModelUnavailable { reason: String },

    // Optimization errors
    #[error("No feasible design found: {0}")]
    OptimizationInfeasible(Box<OptimizationFailure>),

    // Conversation errors
    #[error("Cannot {requested} while {phase}")]
    StateViolation { phase: Phase, requested: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BeamdesignError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn resource(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Resource {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn model_unavailable(reason: impl Into<String>) -> Self {
        Self::ModelUnavailable {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BeamdesignError>;
