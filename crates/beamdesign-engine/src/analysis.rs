use beamdesign_core::error::{BeamdesignError, Result};
use beamdesign_core::models::{AnalysisResult, AnalysisSource, BeamDesign, FeatureVector};
use beamdesign_core::ports::{DeflectionPredictor, ModelAvailability};
use std::sync::Arc;

use crate::physics;

/// One way of estimating deflection
pub trait DeflectionEstimator: Send + Sync {
    fn source(&self) -> AnalysisSource;

    /// Midspan deflection in mm for a validated design
    fn estimate(&self, design: &BeamDesign) -> Result<f64>;
}

/// Closed-form estimator; never fails on a valid design
#[derive(Debug, Clone, Copy, Default)]
pub struct PhysicsEstimator;

impl DeflectionEstimator for PhysicsEstimator {
    fn source(&self) -> AnalysisSource {
        AnalysisSource::Physics
    }

    fn estimate(&self, design: &BeamDesign) -> Result<f64> {
        Ok(physics::deflection_mm(design))
    }
}

/// Estimator backed by a trained predictor
pub struct ModelEstimator {
    predictor: Arc<dyn DeflectionPredictor>,
}

impl ModelEstimator {
    pub fn new(predictor: Arc<dyn DeflectionPredictor>) -> Self {
        Self { predictor }
    }
}

impl DeflectionEstimator for ModelEstimator {
    fn source(&self) -> AnalysisSource {
        AnalysisSource::Model
    }

    fn estimate(&self, design: &BeamDesign) -> Result<f64> {
        let features = FeatureVector::from_design(design);
        self.predictor.predict(&features, design.load_n)
    }
}

/// Ordered estimator chain; the first estimator that succeeds wins
pub struct AnalysisEngine {
    chain: Vec<Box<dyn DeflectionEstimator>>,
}

impl AnalysisEngine {
    pub fn new(chain: Vec<Box<dyn DeflectionEstimator>>) -> Self {
        Self { chain }
    }

    pub fn physics_only() -> Self {
        Self::new(vec![Box::new(PhysicsEstimator)])
    }

    /// Model first when available, physics always last
    pub fn from_availability(availability: &ModelAvailability) -> Self {
        match availability {
            ModelAvailability::Available(predictor) => Self::new(vec![
                Box::new(ModelEstimator::new(Arc::clone(predictor))),
                Box::new(PhysicsEstimator),
            ]),
            ModelAvailability::Unavailable { .. } => Self::physics_only(),
        }
    }

    pub fn sources(&self) -> Vec<AnalysisSource> {
        self.chain.iter().map(|e| e.source()).collect()
    }

    /// Deflection from the first estimator that produces a usable value
    pub fn deflection(&self, design: &BeamDesign) -> Result<(f64, AnalysisSource)> {
        design.validate()?;

        let mut last_error = None;
        for estimator in &self.chain {
            match estimator.estimate(design) {
                Ok(d) if d.is_finite() && d >= 0.0 => return Ok((d, estimator.source())),
                Ok(d) => {
                    tracing::debug!(source = %estimator.source(), deflection = d, "Estimator returned unusable value");
                    last_error = Some(BeamdesignError::model_unavailable(format!(
                        "{} estimator returned {}",
                        estimator.source(),
                        d
                    )));
                }
                Err(e) => {
                    tracing::debug!(source = %estimator.source(), "Estimator failed, falling back: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| BeamdesignError::model_unavailable("no deflection estimator configured")))
    }

    pub fn analyze(&self, design: &BeamDesign) -> Result<AnalysisResult> {
        let (deflection_mm, source) = self.deflection(design)?;
        Ok(AnalysisResult::new(
            deflection_mm,
            design.serviceability_limit_mm(),
            source,
            design.volume_mm3(),
        ))
    }
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::physics_only()
    }
}

impl std::fmt::Debug for AnalysisEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisEngine").field("chain", &self.sources()).finish()
    }
}
