//! Multi-start search seeded from the design corpus.
//!
//! Samples a scale grid and random log-uniform points around a seed
//! section, then refines the best passing starts with a golden-section
//! search over width, taking for each width the smallest passing height.

use beamdesign_core::models::{HistoricalDesign, StrategyKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::problem::{better, Attempt, Bounds, Budget, Candidate, Problem};
use super::strategy::OptimizationStrategy;

const SCALES: [f64; 8] = [0.25, 0.5, 0.75, 1.0, 1.5, 2.0, 3.0, 5.0];
const REFINED_STARTS: usize = 4;
const GOLDEN_ITERATIONS: usize = 40;
const HEIGHT_BISECTIONS: usize = 50;
/// Half-width of the refinement window, in `ln w`
const WINDOW: f64 = 2.5;

#[derive(Debug, Clone, Copy)]
pub struct MultiStart {
    bound_factor: f64,
}

impl MultiStart {
    pub fn new(bound_factor: f64) -> Self {
        Self { bound_factor }
    }

    /// Leanest passing corpus row for the same material and length
    fn corpus_seed<'a>(problem: &'a Problem<'_>) -> Option<&'a HistoricalDesign> {
        let design = &problem.design;
        problem
            .history
            .iter()
            .filter(|row| {
                row.material == design.material
                    && row.status.is_pass()
                    && row.matches_length(design.length_mm, problem.settings.length_tolerance_pct)
            })
            .min_by(|a, b| a.volume_mm3.total_cmp(&b.volume_mm3))
    }

    fn seed(problem: &Problem<'_>) -> (f64, f64) {
        match Self::corpus_seed(problem) {
            Some(row) => (row.width_mm, row.height_mm),
            None => (problem.design.width_mm, problem.design.height_mm),
        }
    }

    /// Smallest passing height for `width_mm`, or `None` when even the
    /// tallest allowed section fails
    fn min_height(problem: &Problem<'_>, bounds: &Bounds, width_mm: f64) -> Option<Candidate> {
        let limit = problem.limit_mm;
        let tallest = problem.evaluate(width_mm, bounds.height.1)?;
        if !tallest.is_feasible(limit) {
            return None;
        }
        let shortest = problem.evaluate(width_mm, bounds.height.0)?;
        if shortest.is_feasible(limit) {
            return Some(shortest);
        }

        let (mut lo, mut hi) = (bounds.height.0.ln(), bounds.height.1.ln());
        let mut found = tallest;
        for _ in 0..HEIGHT_BISECTIONS {
            let mid = 0.5 * (lo + hi);
            match problem.evaluate(width_mm, mid.exp()) {
                Some(candidate) if candidate.is_feasible(limit) => {
                    hi = mid;
                    found = candidate;
                }
                _ => lo = mid,
            }
        }
        Some(found)
    }

    /// Golden-section search on `ln w` of `w·L·h_min(w)` around a start
    fn refine(
        problem: &Problem<'_>,
        bounds: &Bounds,
        start: &Candidate,
        iterations: &mut usize,
        budget: &Budget,
    ) -> Option<Candidate> {
        let lower = bounds.width.0.ln();
        let upper = bounds.width.1.ln();
        let centre = start.width_mm.ln();
        let (mut a, mut b) = ((centre - WINDOW).max(lower), (centre + WINDOW).min(upper));

        let volume = |u: f64| -> (f64, Option<Candidate>) {
            match Self::min_height(problem, bounds, u.exp()) {
                Some(candidate) => (candidate.volume_mm3, Some(candidate)),
                None => (f64::INFINITY, None),
            }
        };

        let ratio = (5f64.sqrt() - 1.0) / 2.0;
        let mut c = b - ratio * (b - a);
        let mut d = a + ratio * (b - a);
        let (mut fc, mut best_c) = volume(c);
        let (mut fd, mut best_d) = volume(d);
        let mut best = None;
        for candidate in [best_c, best_d].into_iter().flatten() {
            best = better(best, candidate, problem.limit_mm);
        }

        for _ in 0..GOLDEN_ITERATIONS {
            if budget.exhausted(*iterations) {
                break;
            }
            *iterations += 1;

            // infeasible widths sit left of feasible ones
            if fc <= fd && fc.is_finite() {
                b = d;
                d = c;
                (fd, best_d) = (fc, best_c);
                c = b - ratio * (b - a);
                (fc, best_c) = volume(c);
                if let Some(candidate) = best_c {
                    best = better(best, candidate, problem.limit_mm);
                }
            } else {
                a = c;
                c = d;
                (fc, best_c) = (fd, best_d);
                d = a + ratio * (b - a);
                (fd, best_d) = volume(d);
                if let Some(candidate) = best_d {
                    best = better(best, candidate, problem.limit_mm);
                }
            }
        }
        best
    }
}

impl Default for MultiStart {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl OptimizationStrategy for MultiStart {
    fn kind(&self) -> StrategyKind {
        StrategyKind::MultiStart
    }

    fn bounds(&self, problem: &Problem<'_>) -> Bounds {
        let (seed_w, seed_h) = Self::seed(problem);
        Bounds::around(&problem.design, self.bound_factor).including(2.0 * seed_w, 2.0 * seed_h)
    }

    fn attempt(&self, problem: &Problem<'_>, bounds: &Bounds, budget: &Budget) -> Attempt {
        let limit = problem.limit_mm;
        let (seed_w, seed_h) = Self::seed(problem);
        let samples = problem.settings.multistart_samples.max(1);

        let mut points = Vec::with_capacity(samples.max(SCALES.len() * SCALES.len() + 1));
        points.push(bounds.clamp(seed_w, seed_h));
        for sw in SCALES {
            for sh in SCALES {
                points.push(bounds.clamp(seed_w * sw, seed_h * sh));
            }
        }
        let lo = bounds.log_lower();
        let hi = bounds.log_upper();
        let mut rng = StdRng::seed_from_u64(problem.settings.search_seed);
        while points.len() < samples {
            let u = if hi[0] > lo[0] { rng.gen_range(lo[0]..hi[0]) } else { lo[0] };
            let v = if hi[1] > lo[1] { rng.gen_range(lo[1]..hi[1]) } else { lo[1] };
            points.push((u.exp(), v.exp()));
        }

        let mut iterations = 0;
        let mut best: Option<Candidate> = None;
        let mut feasible = Vec::new();
        for (w, h) in points {
            if budget.exhausted(iterations) {
                break;
            }
            iterations += 1;
            if let Some(candidate) = problem.evaluate(w, h) {
                if candidate.is_feasible(limit) {
                    feasible.push(candidate);
                }
                best = better(best, candidate, limit);
            }
        }

        feasible.sort_by(|a, b| a.volume_mm3.total_cmp(&b.volume_mm3));
        for start in feasible.iter().take(REFINED_STARTS) {
            if budget.exhausted(iterations) {
                break;
            }
            if let Some(refined) = Self::refine(problem, bounds, start, &mut iterations, budget) {
                best = better(best, refined, limit);
            }
        }

        match best {
            Some(candidate) if candidate.is_feasible(limit) => Attempt::Converged {
                candidate,
                iterations,
            },
            other => Attempt::NoConvergence {
                best: other,
                iterations,
                reason: format!("none of {} sampled sections passes", iterations),
            },
        }
    }
}
