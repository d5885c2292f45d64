//! Trust-region solver on a quadratic-penalty merit function.
//!
//! Merit in log coordinates: `ln w + ln h + ρ·max(0, g(x) + margin)²`.
//! Steps are Cauchy steps of a linear model, projected onto the box. The
//! best strictly passing iterate seen is what gets reported.

use beamdesign_core::models::StrategyKind;

use super::problem::{better, Attempt, Bounds, Budget, Candidate, Problem};
use super::strategy::OptimizationStrategy;

const INITIAL_RADIUS: f64 = 0.5;
const MAX_RADIUS: f64 = 2.0;
const MIN_RADIUS: f64 = 1e-10;
const ACCEPT_RATIO: f64 = 0.1;
const EXPAND_RATIO: f64 = 0.75;
const SHRINK_RATIO: f64 = 0.25;
/// Target `g ≤ −margin` so the merit minimizer stays on the passing side
const MARGIN: f64 = 1e-4;
const INITIAL_PENALTY: f64 = 1e5;
const PENALTY_ROUNDS: usize = 3;

#[derive(Debug, Clone, Copy)]
pub struct TrustRegion {
    bound_factor: f64,
}

impl TrustRegion {
    pub fn new(bound_factor: f64) -> Self {
        Self { bound_factor }
    }

    fn merit(problem: &Problem<'_>, bounds: &Bounds, x: [f64; 2], rho: f64) -> Option<f64> {
        let g = problem.log_constraint(x, bounds)?;
        let violation = (g + MARGIN).max(0.0);
        Some(x[0] + x[1] + rho * violation * violation)
    }

    fn merit_gradient(problem: &Problem<'_>, bounds: &Bounds, x: [f64; 2], rho: f64) -> Option<[f64; 2]> {
        let g = problem.log_constraint(x, bounds)?;
        let violation = (g + MARGIN).max(0.0);
        if violation == 0.0 {
            return Some([1.0, 1.0]);
        }
        let dg = problem.log_constraint_gradient(x)?;
        Some([
            1.0 + 2.0 * rho * violation * dg[0],
            1.0 + 2.0 * rho * violation * dg[1],
        ])
    }

    /// Projected steepest-descent direction, zero along pinned coordinates
    fn projected(bounds: &Bounds, x: [f64; 2], grad: [f64; 2]) -> [f64; 2] {
        let lo = bounds.log_lower();
        let hi = bounds.log_upper();
        let mut dir = [-grad[0], -grad[1]];
        for i in 0..2 {
            if (x[i] <= lo[i] + 1e-12 && dir[i] < 0.0) || (x[i] >= hi[i] - 1e-12 && dir[i] > 0.0) {
                dir[i] = 0.0;
            }
        }
        dir
    }
}

impl Default for TrustRegion {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl OptimizationStrategy for TrustRegion {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TrustRegion
    }

    fn bounds(&self, problem: &Problem<'_>) -> Bounds {
        Bounds::around(&problem.design, self.bound_factor)
    }

    fn attempt(&self, problem: &Problem<'_>, bounds: &Bounds, budget: &Budget) -> Attempt {
        let limit = problem.limit_mm;
        let mut x = bounds.clamp_log([problem.design.width_mm.ln(), problem.design.height_mm.ln()]);
        let mut best: Option<Candidate> = None;
        let mut iterations = 0;
        let mut rho = INITIAL_PENALTY;

        for round in 0..PENALTY_ROUNDS {
            let mut radius = INITIAL_RADIUS;
            let Some(mut current) = Self::merit(problem, bounds, x, rho) else {
                break;
            };

            while radius > MIN_RADIUS {
                if budget.exhausted(iterations) {
                    return Attempt::NoConvergence {
                        best,
                        iterations,
                        reason: format!("budget exhausted in penalty round {}", round + 1),
                    };
                }
                iterations += 1;

                let Some(grad) = Self::merit_gradient(problem, bounds, x, rho) else {
                    break;
                };
                let dir = Self::projected(bounds, x, grad);
                let norm = (dir[0] * dir[0] + dir[1] * dir[1]).sqrt();
                if norm < 1e-12 {
                    break;
                }

                let trial = bounds.clamp_log([
                    x[0] + radius * dir[0] / norm,
                    x[1] + radius * dir[1] / norm,
                ]);
                let predicted = -(grad[0] * (trial[0] - x[0]) + grad[1] * (trial[1] - x[1]));
                let actual = Self::merit(problem, bounds, trial, rho).map(|m| current - m);

                let ratio = match actual {
                    Some(actual) if predicted > 0.0 => actual / predicted,
                    _ => f64::NEG_INFINITY,
                };

                if ratio > ACCEPT_RATIO {
                    x = trial;
                    current -= actual.unwrap_or(0.0);
                    if let Some(candidate) = problem.evaluate_log(x, bounds) {
                        best = better(best, candidate, limit);
                    }
                }
                if ratio > EXPAND_RATIO {
                    radius = (radius * 2.0).min(MAX_RADIUS);
                } else if ratio < SHRINK_RATIO {
                    radius *= SHRINK_RATIO;
                }
            }

            match best {
                Some(candidate) if candidate.is_feasible(limit) => {
                    return Attempt::Converged {
                        candidate,
                        iterations,
                    };
                }
                _ => rho *= 100.0,
            }
        }

        Attempt::NoConvergence {
            best,
            iterations,
            reason: "penalty rounds ended without a passing iterate".to_string(),
        }
    }
}
