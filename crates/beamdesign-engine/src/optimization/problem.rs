use beamdesign_core::config::OptimizerSettings;
use beamdesign_core::models::{BeamDesign, HistoricalDesign, MIN_SECTION_MM};
use std::time::{Duration, Instant};

use crate::analysis::AnalysisEngine;

/// A cross-section evaluated against the serviceability limit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub width_mm: f64,
    pub height_mm: f64,
    pub deflection_mm: f64,
    pub volume_mm3: f64,
}

impl Candidate {
    pub fn is_feasible(&self, limit_mm: f64) -> bool {
        self.deflection_mm <= limit_mm
    }

    /// Deflection in excess of the limit, zero when feasible
    pub fn gap_mm(&self, limit_mm: f64) -> f64 {
        (self.deflection_mm - limit_mm).max(0.0)
    }
}

/// Box constraints on (width, height), in mm
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: (f64, f64),
    pub height: (f64, f64),
}

impl Bounds {
    /// `[MIN_SECTION_MM, factor × current]` on each axis
    pub fn around(design: &BeamDesign, factor: f64) -> Self {
        let upper = |current: f64| (current * factor).max(MIN_SECTION_MM);
        Self {
            width: (MIN_SECTION_MM, upper(design.width_mm)),
            height: (MIN_SECTION_MM, upper(design.height_mm)),
        }
    }

    /// Grow the upper bounds so that `(width, height)` fits
    pub fn including(mut self, width_mm: f64, height_mm: f64) -> Self {
        self.width.1 = self.width.1.max(width_mm);
        self.height.1 = self.height.1.max(height_mm);
        self
    }

    pub fn clamp(&self, width_mm: f64, height_mm: f64) -> (f64, f64) {
        (
            width_mm.clamp(self.width.0, self.width.1),
            height_mm.clamp(self.height.0, self.height.1),
        )
    }

    pub fn log_lower(&self) -> [f64; 2] {
        [self.width.0.ln(), self.height.0.ln()]
    }

    pub fn log_upper(&self) -> [f64; 2] {
        [self.width.1.ln(), self.height.1.ln()]
    }

    pub fn clamp_log(&self, x: [f64; 2]) -> [f64; 2] {
        let lo = self.log_lower();
        let hi = self.log_upper();
        [x[0].clamp(lo[0], hi[0]), x[1].clamp(lo[1], hi[1])]
    }
}

/// Iteration and wall-clock limits for one strategy attempt
#[derive(Debug, Clone, Copy)]
pub struct Budget {
    pub max_iterations: usize,
    pub deadline: Instant,
}

impl Budget {
    pub fn new(max_iterations: usize, time_budget: Duration) -> Self {
        Self {
            max_iterations,
            deadline: Instant::now() + time_budget,
        }
    }

    pub fn exhausted(&self, iterations: usize) -> bool {
        iterations >= self.max_iterations || Instant::now() >= self.deadline
    }
}

/// Outcome of one strategy attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt {
    Converged {
        candidate: Candidate,
        iterations: usize,
    },
    NoConvergence {
        best: Option<Candidate>,
        iterations: usize,
        reason: String,
    },
}

/// Minimize `L·w·h` subject to `deflection(w, h) ≤ L/240`
pub struct Problem<'a> {
    pub design: BeamDesign,
    pub limit_mm: f64,
    pub history: &'a [HistoricalDesign],
    pub settings: OptimizerSettings,
    analysis: &'a AnalysisEngine,
}

impl<'a> Problem<'a> {
    pub fn new(
        design: BeamDesign,
        analysis: &'a AnalysisEngine,
        history: &'a [HistoricalDesign],
        settings: OptimizerSettings,
    ) -> Self {
        Self {
            limit_mm: design.serviceability_limit_mm(),
            design,
            history,
            settings,
            analysis,
        }
    }

    /// Evaluate a section; `None` when no estimator can handle it
    pub fn evaluate(&self, width_mm: f64, height_mm: f64) -> Option<Candidate> {
        let trial = self.design.with_section(width_mm, height_mm);
        let (deflection_mm, _) = self.analysis.deflection(&trial).ok()?;
        Some(Candidate {
            width_mm,
            height_mm,
            deflection_mm,
            volume_mm3: trial.volume_mm3(),
        })
    }

    /// Evaluate at log coordinates, clamped to `bounds` in mm
    pub fn evaluate_log(&self, x: [f64; 2], bounds: &Bounds) -> Option<Candidate> {
        let (w, h) = bounds.clamp(x[0].exp(), x[1].exp());
        self.evaluate(w, h)
    }

    /// `ln(deflection / limit)`; non-positive iff feasible
    pub fn log_constraint(&self, x: [f64; 2], bounds: &Bounds) -> Option<f64> {
        let candidate = self.evaluate_log(x, bounds)?;
        if candidate.deflection_mm <= 0.0 {
            return Some(f64::NEG_INFINITY);
        }
        Some((candidate.deflection_mm / self.limit_mm).ln())
    }

    /// Central-difference gradient of the log constraint
    pub fn log_constraint_gradient(&self, x: [f64; 2]) -> Option<[f64; 2]> {
        const STEP: f64 = 1e-5;
        let mut grad = [0.0; 2];
        for i in 0..2 {
            let mut fwd = x;
            let mut back = x;
            fwd[i] += STEP;
            back[i] -= STEP;
            let g_fwd = self.log_constraint_unclamped(fwd)?;
            let g_back = self.log_constraint_unclamped(back)?;
            grad[i] = (g_fwd - g_back) / (2.0 * STEP);
        }
        Some(grad)
    }

    fn log_constraint_unclamped(&self, x: [f64; 2]) -> Option<f64> {
        let candidate = self.evaluate(x[0].exp(), x[1].exp())?;
        if candidate.deflection_mm <= 0.0 {
            return None;
        }
        Some((candidate.deflection_mm / self.limit_mm).ln())
    }
}

/// Keep whichever candidate is better: feasible beats infeasible, then
/// smaller volume, then smaller constraint gap.
pub fn better(current: Option<Candidate>, challenger: Candidate, limit_mm: f64) -> Option<Candidate> {
    let Some(current) = current else {
        return Some(challenger);
    };
    let keep_challenger = match (current.is_feasible(limit_mm), challenger.is_feasible(limit_mm)) {
        (false, true) => true,
        (true, false) => false,
        (true, true) => challenger.volume_mm3 < current.volume_mm3,
        (false, false) => challenger.gap_mm(limit_mm) < current.gap_mm(limit_mm),
    };
    Some(if keep_challenger { challenger } else { current })
}
