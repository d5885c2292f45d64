use serde::{Deserialize, Serialize};
use std::fmt;

use super::beam::BeamDesign;
use super::profile::ProfileRecommendation;

/// Optimization method that produced (or failed to produce) a design
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Log-barrier projected gradient solver
    GradientBarrier,
    /// Penalty-merit trust-region solver with widened bounds
    TrustRegion,
    /// Corpus-seeded grid and random multi-start search
    MultiStart,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::GradientBarrier => f.write_str("gradient_barrier"),
            StrategyKind::TrustRegion => f.write_str("trust_region"),
            StrategyKind::MultiStart => f.write_str("multi_start"),
        }
    }
}

/// How the optimum relates to the submitted design
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationCategory {
    /// Input passes and the optimum uses less material
    OptimizationSuccess,
    /// Input passes and no smaller section was found
    DesignFeasible,
    /// Input fails; the safe optimum is still smaller than the input
    SafetyUpgradeEfficient,
    /// Input fails; safety requires more material
    SafetyUpgrade,
}

impl OptimizationCategory {
    pub fn classify(input_passes: bool, optimized_volume: f64, input_volume: f64) -> Self {
        let smaller = optimized_volume < input_volume;
        match (input_passes, smaller) {
            (true, true) => OptimizationCategory::OptimizationSuccess,
            (true, false) => OptimizationCategory::DesignFeasible,
            (false, true) => OptimizationCategory::SafetyUpgradeEfficient,
            (false, false) => OptimizationCategory::SafetyUpgrade,
        }
    }
}

/// Which design `volume_saved_pct` is measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineKind {
    /// The submitted design, which already passes
    Input,
    /// The submitted section scaled uniformly until it passes
    NaiveUpsized,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub kind: BaselineKind,
    pub width_mm: f64,
    pub height_mm: f64,
    pub volume_mm3: f64,
}

/// A successful optimization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Optimized design; always analyzes to Pass
    pub specification: BeamDesign,
    pub volume_mm3: f64,
    pub deflection_mm: f64,
    pub limit_mm: f64,
    pub strategy_used: StrategyKind,

    /// Saving against `baseline`, percent
    pub volume_saved_pct: f64,

    /// Change against the submitted design, percent (negative = smaller)
    pub volume_change_vs_input_pct: f64,

    pub baseline: Baseline,
    pub category: OptimizationCategory,

    /// Nearest standard steel section by height (steel only)
    pub snapped_profile: Option<ProfileRecommendation>,

    /// Lightest passing standard section, when lighter than the custom one
    pub standard_alternative: Option<ProfileRecommendation>,

    pub attempts: Vec<StrategyReport>,
}

/// Per-strategy diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyReport {
    pub strategy: StrategyKind,
    pub converged: bool,
    pub iterations: usize,
    pub detail: String,
}

/// No strategy produced a verified passing design
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationFailure {
    pub reason: String,

    /// Closest candidate seen, even though it fails
    pub best_candidate: Option<BeamDesign>,

    /// Deflection in excess of the limit for `best_candidate`
    pub constraint_gap_mm: Option<f64>,

    pub attempts: Vec<StrategyReport>,
}

impl fmt::Display for OptimizationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason)?;
        if let (Some(candidate), Some(gap)) = (&self.best_candidate, self.constraint_gap_mm) {
            write!(
                f,
                " (best candidate {:.1}×{:.1} mm exceeds the limit by {:.2} mm)",
                candidate.width_mm, candidate.height_mm, gap
            )?;
        }
        Ok(())
    }
}

/// Optimization result as recorded on a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OptimizationReport {
    Optimized(Box<OptimizationResult>),
    Failed(OptimizationFailure),
}

impl OptimizationReport {
    pub fn is_success(&self) -> bool {
        matches!(self, OptimizationReport::Optimized(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_matrix() {
        assert_eq!(
            OptimizationCategory::classify(true, 1.0, 2.0),
            OptimizationCategory::OptimizationSuccess
        );
        assert_eq!(
            OptimizationCategory::classify(true, 2.0, 2.0),
            OptimizationCategory::DesignFeasible
        );
        assert_eq!(
            OptimizationCategory::classify(false, 1.0, 2.0),
            OptimizationCategory::SafetyUpgradeEfficient
        );
        assert_eq!(
            OptimizationCategory::classify(false, 3.0, 2.0),
            OptimizationCategory::SafetyUpgrade
        );
    }

    #[test]
    fn test_failure_display_mentions_gap() {
        use crate::models::{LoadType, Material};

        let failure = OptimizationFailure {
            reason: "all strategies exhausted".to_string(),
            best_candidate: Some(
                BeamDesign::new(Material::Wood, 9000.0, 90_000.0, LoadType::Point, 30.0, 90.0)
                    .unwrap(),
            ),
            constraint_gap_mm: Some(4.25),
            attempts: Vec::new(),
        };
        let text = failure.to_string();
        assert!(text.contains("all strategies exhausted"));
        assert!(text.contains("4.25 mm"));
    }
}
