//! Beamdesign Engine - Deflection analysis, optimization and comparison
//!
//! All engines are pure: they take complete designs by value or reference
//! and return fresh results. Persistence is left to the caller.

pub mod analysis;
pub mod comparison;
pub mod optimization;
pub mod physics;
pub mod predictor;
pub mod profiles;

pub use analysis::{AnalysisEngine, DeflectionEstimator, ModelEstimator, PhysicsEstimator};
pub use comparison::ComparisonEngine;
pub use optimization::OptimizationEngine;
pub use predictor::{JsonModelLoader, LinearDeflectionModel};
pub use profiles::ProfileAdvisor;
