//! Cross-section optimization.
//!
//! Minimizes beam volume subject to the serviceability limit with an
//! escalating sequence of strategies. Each converged answer is re-checked
//! with the analysis engine before it is accepted; a strategy that fails
//! hands over to the next one.

pub mod gradient;
pub mod multistart;
pub mod problem;
pub mod strategy;
pub mod trust_region;

use beamdesign_core::config::OptimizerSettings;
use beamdesign_core::models::{
    Baseline, BaselineKind, BeamDesign, HistoricalDesign, OptimizationCategory,
    OptimizationFailure, OptimizationResult, StrategyKind, StrategyReport, MIN_SECTION_MM,
};
use beamdesign_core::{BeamdesignError, Result};
use std::sync::Arc;

use crate::analysis::AnalysisEngine;
use crate::profiles::ProfileAdvisor;

pub use gradient::GradientBarrier;
pub use multistart::MultiStart;
pub use problem::{Attempt, Bounds, Budget, Candidate, Problem};
pub use strategy::OptimizationStrategy;
pub use trust_region::TrustRegion;

const UPSIZE_DOUBLINGS: usize = 30;
const UPSIZE_BISECTIONS: usize = 60;

pub struct OptimizationEngine {
    analysis: Arc<AnalysisEngine>,
    strategies: Vec<Box<dyn OptimizationStrategy>>,
    settings: OptimizerSettings,
    profiles: ProfileAdvisor,
}

impl OptimizationEngine {
    /// Barrier, then trust region, then corpus-seeded multi-start
    pub fn new(analysis: Arc<AnalysisEngine>, settings: OptimizerSettings) -> Self {
        Self::with_strategies(
            analysis,
            settings,
            vec![
                Box::new(GradientBarrier::default()),
                Box::new(TrustRegion::default()),
                Box::new(MultiStart::default()),
            ],
        )
    }

    pub fn with_strategies(
        analysis: Arc<AnalysisEngine>,
        settings: OptimizerSettings,
        strategies: Vec<Box<dyn OptimizationStrategy>>,
    ) -> Self {
        Self {
            analysis,
            strategies,
            settings,
            profiles: ProfileAdvisor::default(),
        }
    }

    pub fn with_profiles(mut self, profiles: ProfileAdvisor) -> Self {
        self.profiles = profiles;
        self
    }

    pub fn settings(&self) -> &OptimizerSettings {
        &self.settings
    }

    pub fn analysis(&self) -> &Arc<AnalysisEngine> {
        &self.analysis
    }

    /// Smallest-volume passing section for `design`.
    ///
    /// `history` seeds the multi-start strategy. Nothing is persisted.
    pub fn optimize(
        &self,
        design: &BeamDesign,
        history: &[HistoricalDesign],
    ) -> Result<OptimizationResult> {
        let input = self.analysis.analyze(design)?;
        let problem = Problem::new(*design, &self.analysis, history, self.settings);
        let limit = problem.limit_mm;

        let mut attempts = Vec::with_capacity(self.strategies.len());
        let mut fallback: Option<(StrategyKind, Candidate)> = None;
        let mut closest_miss: Option<Candidate> = None;
        let mut chosen: Option<(StrategyKind, Candidate)> = None;

        for strategy in &self.strategies {
            let kind = strategy.kind();
            let bounds = strategy.bounds(&problem);
            let budget = Budget::new(self.settings.max_iterations, self.settings.time_budget);

            match strategy.attempt(&problem, &bounds, &budget) {
                Attempt::Converged {
                    candidate,
                    iterations,
                } => {
                    if self.verify(design, &candidate) {
                        attempts.push(StrategyReport {
                            strategy: kind,
                            converged: true,
                            iterations,
                            detail: format!(
                                "{:.2} × {:.2} mm, deflection {:.3} mm",
                                candidate.width_mm, candidate.height_mm, candidate.deflection_mm
                            ),
                        });
                        chosen = Some((kind, candidate));
                        break;
                    }
                    tracing::warn!(strategy = %kind, "Converged section failed verification");
                    attempts.push(StrategyReport {
                        strategy: kind,
                        converged: false,
                        iterations,
                        detail: "converged section failed verification".to_string(),
                    });
                    closest_miss = problem::better(closest_miss, candidate, limit);
                }
                Attempt::NoConvergence {
                    best,
                    iterations,
                    reason,
                } => {
                    tracing::debug!(strategy = %kind, iterations, "Strategy did not converge: {}", reason);
                    attempts.push(StrategyReport {
                        strategy: kind,
                        converged: false,
                        iterations,
                        detail: reason,
                    });
                    if let Some(candidate) = best {
                        if self.verify(design, &candidate) {
                            let keep = match fallback {
                                Some((_, current)) => candidate.volume_mm3 < current.volume_mm3,
                                None => true,
                            };
                            if keep {
                                fallback = Some((kind, candidate));
                            }
                        } else {
                            closest_miss = problem::better(closest_miss, candidate, limit);
                        }
                    }
                }
            }
        }

        let (strategy_used, candidate) = match (chosen, fallback) {
            (Some(chosen), _) => chosen,
            (None, Some(fallback)) => {
                tracing::warn!(
                    strategy = %fallback.0,
                    "No strategy converged, using best passing iterate"
                );
                fallback
            }
            (None, None) => {
                tracing::warn!(
                    material = %design.material,
                    length_mm = design.length_mm,
                    "No passing section found"
                );
                return Err(BeamdesignError::OptimizationInfeasible(Box::new(
                    OptimizationFailure {
                        reason: "no cross-section within the search bounds meets the deflection limit"
                            .to_string(),
                        best_candidate: closest_miss
                            .map(|c| design.with_section(c.width_mm, c.height_mm)),
                        constraint_gap_mm: closest_miss.map(|c| c.gap_mm(limit)),
                        attempts,
                    },
                )));
            }
        };

        let optimized = design.with_section(candidate.width_mm, candidate.height_mm);
        let baseline = self.baseline(design, input.status.is_pass());
        let volume_mm3 = optimized.volume_mm3();
        let input_volume = design.volume_mm3();

        tracing::info!(
            strategy = %strategy_used,
            width_mm = optimized.width_mm,
            height_mm = optimized.height_mm,
            "Optimization finished"
        );

        Ok(OptimizationResult {
            specification: optimized,
            volume_mm3,
            deflection_mm: candidate.deflection_mm,
            limit_mm: limit,
            strategy_used,
            volume_saved_pct: (baseline.volume_mm3 - volume_mm3) / baseline.volume_mm3 * 100.0,
            volume_change_vs_input_pct: (volume_mm3 - input_volume) / input_volume * 100.0,
            baseline,
            category: OptimizationCategory::classify(input.status.is_pass(), volume_mm3, input_volume),
            snapped_profile: self.profiles.snap(&optimized),
            standard_alternative: self.profiles.more_efficient_standard(&optimized),
            attempts,
        })
    }

    fn verify(&self, design: &BeamDesign, candidate: &Candidate) -> bool {
        if candidate.width_mm < MIN_SECTION_MM || candidate.height_mm < MIN_SECTION_MM {
            return false;
        }
        let section = design.with_section(candidate.width_mm, candidate.height_mm);
        self.analysis
            .analyze(&section)
            .map(|analysis| analysis.status.is_pass())
            .unwrap_or(false)
    }

    fn passes_scaled(&self, design: &BeamDesign, scale: f64) -> bool {
        let section = design.with_section(design.width_mm * scale, design.height_mm * scale);
        self.analysis
            .analyze(&section)
            .map(|analysis| analysis.status.is_pass())
            .unwrap_or(false)
    }

    /// The input itself when it passes, otherwise the input scaled
    /// uniformly until it just passes
    fn baseline(&self, design: &BeamDesign, input_passes: bool) -> Baseline {
        let input = Baseline {
            kind: BaselineKind::Input,
            width_mm: design.width_mm,
            height_mm: design.height_mm,
            volume_mm3: design.volume_mm3(),
        };
        if input_passes {
            return input;
        }

        let mut lo = 1.0;
        let mut hi = 2.0;
        let mut found = false;
        for _ in 0..UPSIZE_DOUBLINGS {
            if self.passes_scaled(design, hi) {
                found = true;
                break;
            }
            lo = hi;
            hi *= 2.0;
        }
        if !found {
            tracing::debug!("Uniform upsizing never passes, comparing against the input");
            return input;
        }

        for _ in 0..UPSIZE_BISECTIONS {
            let mid = 0.5 * (lo + hi);
            if self.passes_scaled(design, mid) {
                hi = mid;
            } else {
                lo = mid;
            }
        }

        let upsized = design.with_section(design.width_mm * hi, design.height_mm * hi);
        Baseline {
            kind: BaselineKind::NaiveUpsized,
            width_mm: upsized.width_mm,
            height_mm: upsized.height_mm,
            volume_mm3: upsized.volume_mm3(),
        }
    }
}

impl std::fmt::Debug for OptimizationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds: Vec<StrategyKind> = self.strategies.iter().map(|s| s.kind()).collect();
        f.debug_struct("OptimizationEngine")
            .field("strategies", &kinds)
            .field("settings", &self.settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beamdesign_core::models::{LoadType, Material};

    /// Always claims convergence on a section that fails
    struct Liar;

    impl OptimizationStrategy for Liar {
        fn kind(&self) -> StrategyKind {
            StrategyKind::GradientBarrier
        }

        fn bounds(&self, problem: &Problem<'_>) -> Bounds {
            Bounds::around(&problem.design, 1.0)
        }

        fn attempt(&self, problem: &Problem<'_>, _: &Bounds, _: &Budget) -> Attempt {
            Attempt::Converged {
                candidate: problem.evaluate(10.0, 10.0).unwrap(),
                iterations: 1,
            }
        }
    }

    fn scenario() -> BeamDesign {
        BeamDesign::new(Material::Steel, 6000.0, 20000.0, LoadType::Point, 200.0, 100.0).unwrap()
    }

    fn engine() -> OptimizationEngine {
        OptimizationEngine::new(Arc::new(AnalysisEngine::physics_only()), OptimizerSettings::default())
    }

    #[test]
    fn test_failing_input_gets_naive_upsized_baseline() {
        let result = engine().optimize(&scenario(), &[]).unwrap();

        assert_eq!(result.baseline.kind, BaselineKind::NaiveUpsized);
        // δ scales with s⁻⁴, so the upsize factor is 1.08^¼
        let scale = 1.08f64.powf(0.25);
        assert!((result.baseline.width_mm - 200.0 * scale).abs() < 1e-3);
        assert!(result.volume_saved_pct > 80.0);
        assert_eq!(result.category, OptimizationCategory::SafetyUpgradeEfficient);
        assert!(result.deflection_mm <= result.limit_mm);
    }

    #[test]
    fn test_passing_input_uses_itself_as_baseline() {
        let design = scenario().with_section(200.0, 200.0);
        let result = engine().optimize(&design, &[]).unwrap();

        assert_eq!(result.baseline.kind, BaselineKind::Input);
        assert_eq!(result.category, OptimizationCategory::OptimizationSuccess);
        assert!((result.volume_saved_pct + result.volume_change_vs_input_pct).abs() < 1e-9);
    }

    #[test]
    fn test_unverified_convergence_escalates() {
        let engine = OptimizationEngine::with_strategies(
            Arc::new(AnalysisEngine::physics_only()),
            OptimizerSettings::default(),
            vec![Box::new(Liar), Box::new(MultiStart::default())],
        );
        let result = engine.optimize(&scenario(), &[]).unwrap();

        assert_eq!(result.strategy_used, StrategyKind::MultiStart);
        assert_eq!(result.attempts.len(), 2);
        assert!(!result.attempts[0].converged);
    }

    #[test]
    fn test_infeasible_request_reports_closest_miss() {
        let design =
            BeamDesign::new(Material::Wood, 12000.0, 5.0e6, LoadType::Point, 20.0, 20.0).unwrap();
        match engine().optimize(&design, &[]) {
            Err(BeamdesignError::OptimizationInfeasible(failure)) => {
                assert_eq!(failure.attempts.len(), 3);
                assert!(failure.best_candidate.is_some());
                assert!(failure.constraint_gap_mm.unwrap() > 0.0);
            }
            other => panic!("expected infeasible, got {:?}", other),
        }
    }
}
