//! Log-barrier projected gradient solver.
//!
//! Works in `x = (ln w, ln h)`. The objective `ln w + ln h` is linear there
//! and, under the physics estimator, so is the constraint
//! `g(x) = ln(δ / limit) ≤ 0`. Each outer round minimizes
//! `f(x) − μ·ln(−g(x))` by projected gradient descent with Armijo
//! backtracking, then shrinks `μ`.

use beamdesign_core::models::StrategyKind;

use super::problem::{Attempt, Bounds, Budget, Problem};
use super::strategy::OptimizationStrategy;

const MU_START: f64 = 1.0;
const MU_END: f64 = 1e-7;
const MU_SHRINK: f64 = 0.1;
const PHASE_ONE_MARGIN: f64 = 1e-2;
const ARMIJO: f64 = 1e-4;
const MAX_HALVINGS: usize = 60;
const BOUND_EPS: f64 = 1e-12;
const GRAD_TOL: f64 = 1e-10;
/// Inner loop stops once a step moves less than this fraction of `μ`
const STEP_TOL: f64 = 1e-3;

#[derive(Debug, Clone, Copy)]
pub struct GradientBarrier {
    bound_factor: f64,
}

impl GradientBarrier {
    pub fn new(bound_factor: f64) -> Self {
        Self { bound_factor }
    }

    fn barrier(&self, problem: &Problem<'_>, bounds: &Bounds, x: [f64; 2], mu: f64) -> Option<f64> {
        let g = problem.log_constraint(x, bounds)?;
        if g >= 0.0 {
            return None;
        }
        Some(x[0] + x[1] - mu * (-g).ln())
    }

    /// Strictly feasible starting point on the segment from `start` towards
    /// the upper corner of the box.
    fn phase_one(&self, problem: &Problem<'_>, bounds: &Bounds, start: [f64; 2]) -> Option<[f64; 2]> {
        let g_start = problem.log_constraint(start, bounds)?;
        if g_start <= -PHASE_ONE_MARGIN {
            return Some(start);
        }

        let top = bounds.log_upper();
        let g_top = problem.log_constraint(top, bounds)?;
        if g_top >= 0.0 {
            return None;
        }
        if g_top > -PHASE_ONE_MARGIN {
            return Some(top);
        }

        let along = |t: f64| [start[0] + t * (top[0] - start[0]), start[1] + t * (top[1] - start[1])];
        let (mut t_lo, mut t_hi) = (0.0, 1.0);
        for _ in 0..50 {
            let mid = 0.5 * (t_lo + t_hi);
            match problem.log_constraint(along(mid), bounds) {
                Some(g) if g <= -PHASE_ONE_MARGIN => t_hi = mid,
                _ => t_lo = mid,
            }
        }
        Some(along(t_hi))
    }

    /// One projected gradient step with backtracking; `None` when stalled
    fn descent_step(
        &self,
        problem: &Problem<'_>,
        bounds: &Bounds,
        x: [f64; 2],
        mu: f64,
    ) -> Option<[f64; 2]> {
        let g = problem.log_constraint(x, bounds)?;
        if g >= 0.0 {
            return None;
        }
        let dg = problem.log_constraint_gradient(x)?;
        let grad = [1.0 + mu * dg[0] / -g, 1.0 + mu * dg[1] / -g];

        let lo = bounds.log_lower();
        let hi = bounds.log_upper();
        let mut dir = [-grad[0], -grad[1]];
        for i in 0..2 {
            let pinned_low = x[i] <= lo[i] + BOUND_EPS && dir[i] < 0.0;
            let pinned_high = x[i] >= hi[i] - BOUND_EPS && dir[i] > 0.0;
            if pinned_low || pinned_high {
                dir[i] = 0.0;
            }
        }
        let largest = dir[0].abs().max(dir[1].abs());
        if largest < GRAD_TOL {
            return None;
        }

        let phi = x[0] + x[1] - mu * (-g).ln();
        let mut step = 1.0 / largest;
        for _ in 0..MAX_HALVINGS {
            let trial = bounds.clamp_log([x[0] + step * dir[0], x[1] + step * dir[1]]);
            if let Some(phi_trial) = self.barrier(problem, bounds, trial, mu) {
                let predicted = grad[0] * (trial[0] - x[0]) + grad[1] * (trial[1] - x[1]);
                if phi_trial <= phi + ARMIJO * predicted {
                    return Some(trial);
                }
            }
            step *= 0.5;
        }
        None
    }
}

impl Default for GradientBarrier {
    fn default() -> Self {
        Self::new(3.0)
    }
}

impl OptimizationStrategy for GradientBarrier {
    fn kind(&self) -> StrategyKind {
        StrategyKind::GradientBarrier
    }

    fn bounds(&self, problem: &Problem<'_>) -> Bounds {
        Bounds::around(&problem.design, self.bound_factor)
    }

    fn attempt(&self, problem: &Problem<'_>, bounds: &Bounds, budget: &Budget) -> Attempt {
        let start = bounds.clamp_log([problem.design.width_mm.ln(), problem.design.height_mm.ln()]);

        let Some(mut x) = self.phase_one(problem, bounds, start) else {
            return Attempt::NoConvergence {
                best: problem.evaluate(bounds.width.1, bounds.height.1),
                iterations: 0,
                reason: "no passing section inside the bounds".to_string(),
            };
        };

        let mut iterations = 0;
        let mut mu = MU_START;
        while mu >= MU_END {
            loop {
                if budget.exhausted(iterations) {
                    return Attempt::NoConvergence {
                        best: problem.evaluate_log(x, bounds),
                        iterations,
                        reason: format!("budget exhausted at barrier weight {:e}", mu),
                    };
                }
                iterations += 1;

                let Some(next) = self.descent_step(problem, bounds, x, mu) else {
                    break;
                };
                let moved = (next[0] - x[0]).abs().max((next[1] - x[1]).abs());
                x = next;
                if moved < STEP_TOL * mu {
                    break;
                }
            }
            mu *= MU_SHRINK;
        }

        match problem.evaluate_log(x, bounds) {
            Some(candidate) if candidate.is_feasible(problem.limit_mm) => Attempt::Converged {
                candidate,
                iterations,
            },
            other => Attempt::NoConvergence {
                best: other,
                iterations,
                reason: "final iterate violates the deflection limit".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisEngine;
    use beamdesign_core::config::OptimizerSettings;
    use beamdesign_core::models::{BeamDesign, LoadType, Material};

    #[test]
    fn test_reaches_analytic_optimum() {
        let design =
            BeamDesign::new(Material::Steel, 6000.0, 20000.0, LoadType::Point, 200.0, 100.0)
                .unwrap();
        let engine = AnalysisEngine::physics_only();
        let problem = Problem::new(design, &engine, &[], OptimizerSettings::default());
        let strategy = GradientBarrier::default();
        let bounds = strategy.bounds(&problem);
        let budget = Budget::new(400, std::time::Duration::from_secs(5));

        match strategy.attempt(&problem, &bounds, &budget) {
            Attempt::Converged { candidate, .. } => {
                assert!(candidate.is_feasible(problem.limit_mm));
                // w h³ ≥ 2.16e8 with w at its lower bound
                assert!((candidate.width_mm - 10.0).abs() < 1e-6);
                assert!((candidate.height_mm - 278.495).abs() < 0.5);
            }
            other => panic!("expected convergence, got {:?}", other),
        }
    }

    #[test]
    fn test_reports_infeasible_box() {
        // Even 3× the section cannot carry this load
        let design =
            BeamDesign::new(Material::Wood, 12000.0, 5.0e6, LoadType::Point, 20.0, 20.0).unwrap();
        let engine = AnalysisEngine::physics_only();
        let problem = Problem::new(design, &engine, &[], OptimizerSettings::default());
        let strategy = GradientBarrier::default();
        let bounds = strategy.bounds(&problem);
        let budget = Budget::new(400, std::time::Duration::from_secs(5));

        assert!(matches!(
            strategy.attempt(&problem, &bounds, &budget),
            Attempt::NoConvergence { iterations: 0, .. }
        ));
    }
}
