use beamdesign_core::config::DEFAULT_LENGTH_TOLERANCE_PCT;
use beamdesign_core::models::{
    AnalysisResult, BeamDesign, Comparison, Efficiency, HistoricalDesign, Material,
};

/// Finds the leanest passing historical design for a request
#[derive(Debug, Clone, Copy)]
pub struct ComparisonEngine {
    tolerance_pct: f64,
}

impl ComparisonEngine {
    pub fn new(tolerance_pct: f64) -> Self {
        Self { tolerance_pct }
    }

    pub fn tolerance_pct(&self) -> f64 {
        self.tolerance_pct
    }

    /// Minimum-volume passing row of the same material and length.
    ///
    /// Equal volumes prefer the most recently recorded row, then the one
    /// stored later.
    pub fn find_best_alternative(
        &self,
        material: Material,
        length_mm: f64,
        rows: &[HistoricalDesign],
    ) -> Option<HistoricalDesign> {
        rows.iter()
            .enumerate()
            .filter(|(_, row)| {
                row.material == material
                    && row.status.is_pass()
                    && row.matches_length(length_mm, self.tolerance_pct)
            })
            .min_by(|(ia, a), (ib, b)| {
                a.volume_mm3
                    .total_cmp(&b.volume_mm3)
                    // later timestamps and later rows sort first
                    .then_with(|| b.recorded_at.cmp(&a.recorded_at))
                    .then_with(|| ib.cmp(ia))
            })
            .map(|(_, row)| row.clone())
    }

    pub fn compute_efficiency(
        &self,
        design: &BeamDesign,
        analysis: &AnalysisResult,
        alternative: &HistoricalDesign,
    ) -> Efficiency {
        let current = design.volume_mm3();
        Efficiency {
            volume_saved_pct: (current - alternative.volume_mm3) / current * 100.0,
            deflection_delta_mm: alternative.deflection_mm.map(|d| d - analysis.deflection_mm),
        }
    }

    /// Best alternative with efficiency figures, `None` when nothing matches
    pub fn compare(
        &self,
        design: &BeamDesign,
        analysis: &AnalysisResult,
        rows: &[HistoricalDesign],
    ) -> Option<Comparison> {
        let alternative = self.find_best_alternative(design.material, design.length_mm, rows)?;
        let efficiency = self.compute_efficiency(design, analysis, &alternative);

        tracing::debug!(
            material = %design.material,
            length_mm = design.length_mm,
            volume_saved_pct = efficiency.volume_saved_pct,
            "Found historical alternative"
        );
        Some(Comparison {
            alternative,
            efficiency,
        })
    }
}

impl Default for ComparisonEngine {
    fn default() -> Self {
        Self::new(DEFAULT_LENGTH_TOLERANCE_PCT)
    }
}
