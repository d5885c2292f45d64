use beamdesign_core::models::{
    AnalysisResult, BeamDesign, ComparisonOutcome, HistoricalDesign, OptimizationResult,
    StrategyReport,
};
use serde::Serialize;
use tabled::Tabled;

/// Output for analyze command
#[derive(Debug, Serialize)]
pub struct AnalyzeOutput {
    pub design: BeamDesign,
    pub analysis: AnalysisResult,
    pub utilisation_pct: f64,
    pub comparison: Option<ComparisonOutcome>,
}

/// Output for optimize command
#[derive(Debug, Serialize)]
pub struct OptimizeOutput {
    pub input: BeamDesign,
    pub input_analysis: AnalysisResult,
    pub result: OptimizationResult,
    pub persisted: bool,
}

/// One corpus row in the history listing
#[derive(Debug, Serialize, Tabled)]
pub struct HistoryRow {
    #[tabled(rename = "Material")]
    pub material: String,
    #[tabled(rename = "Length (mm)")]
    pub length_mm: f64,
    #[tabled(rename = "Load (N)")]
    pub load_n: f64,
    #[tabled(rename = "Width (mm)")]
    pub width_mm: f64,
    #[tabled(rename = "Height (mm)")]
    pub height_mm: f64,
    #[tabled(rename = "Volume (mm³)")]
    pub volume_mm3: f64,
    #[tabled(rename = "Deflection (mm)")]
    pub deflection_mm: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Provenance")]
    pub provenance: String,
    #[tabled(rename = "Recorded")]
    pub recorded_at: String,
}

impl From<&HistoricalDesign> for HistoryRow {
    fn from(row: &HistoricalDesign) -> Self {
        Self {
            material: row.material.to_string(),
            length_mm: row.length_mm,
            load_n: row.load_n,
            width_mm: row.width_mm,
            height_mm: row.height_mm,
            volume_mm3: row.volume_mm3,
            deflection_mm: row
                .deflection_mm
                .map(|d| format!("{:.2}", d))
                .unwrap_or_else(|| "-".to_string()),
            status: row.status.to_string(),
            provenance: row.provenance.to_string(),
            recorded_at: row
                .recorded_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Per-strategy diagnostics of an optimization run
#[derive(Debug, Serialize, Tabled)]
pub struct AttemptRow {
    #[tabled(rename = "Strategy")]
    pub strategy: String,
    #[tabled(rename = "Converged")]
    pub converged: bool,
    #[tabled(rename = "Iterations")]
    pub iterations: usize,
    #[tabled(rename = "Detail")]
    pub detail: String,
}

impl From<&StrategyReport> for AttemptRow {
    fn from(report: &StrategyReport) -> Self {
        Self {
            strategy: report.strategy.to_string(),
            converged: report.converged,
            iterations: report.iterations,
            detail: report.detail.clone(),
        }
    }
}

/// One configuration key with its effective value and source
#[derive(Debug, Serialize, Tabled)]
pub struct ConfigEntry {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}
