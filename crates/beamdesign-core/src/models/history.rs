use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::analysis::DesignStatus;
use super::beam::{BeamDesign, LoadType, Material};
use crate::error::{BeamdesignError, Result};

/// Where a corpus row came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Part of the seeded historical corpus
    Original,
    /// Appended after a successful optimization
    Optimized,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Original => f.write_str("original"),
            Provenance::Optimized => f.write_str("optimized"),
        }
    }
}

/// A persisted historical design row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalDesign {
    pub material: Material,
    pub length_mm: f64,
    pub load_n: f64,
    pub width_mm: f64,
    pub height_mm: f64,
    pub volume_mm3: f64,

    /// Recorded deflection, absent in some legacy rows
    pub deflection_mm: Option<f64>,

    pub status: DesignStatus,
    pub provenance: Provenance,

    /// When the row was recorded, if known
    pub recorded_at: Option<DateTime<Utc>>,
}

impl HistoricalDesign {
    /// Row for a freshly optimized design
    pub fn optimized(design: &BeamDesign, deflection_mm: f64, recorded_at: DateTime<Utc>) -> Self {
        Self {
            material: design.material,
            length_mm: design.length_mm,
            load_n: design.load_n,
            width_mm: design.width_mm,
            height_mm: design.height_mm,
            volume_mm3: design.volume_mm3(),
            deflection_mm: Some(deflection_mm),
            status: DesignStatus::evaluate(deflection_mm, design.serviceability_limit_mm()),
            provenance: Provenance::Optimized,
            recorded_at: Some(recorded_at),
        }
    }

    /// Check numeric columns before persisting
    pub fn validate(&self) -> Result<()> {
        let columns = [
            ("length_mm", self.length_mm),
            ("load_n", self.load_n),
            ("width_mm", self.width_mm),
            ("height_mm", self.height_mm),
            ("volume_mm3", self.volume_mm3),
        ];
        for (name, value) in columns {
            if !value.is_finite() || value <= 0.0 {
                return Err(BeamdesignError::validation(
                    name,
                    format!("corpus rows need positive values, got {}", value),
                ));
            }
        }
        if let Some(deflection) = self.deflection_mm {
            if !deflection.is_finite() || deflection < 0.0 {
                return Err(BeamdesignError::validation(
                    "deflection_mm",
                    format!("must be a non-negative number, got {}", deflection),
                ));
            }
        }
        Ok(())
    }

    /// Same length/material/load with this row's cross-section
    pub fn as_design(&self, load_type: LoadType) -> Result<BeamDesign> {
        BeamDesign::new(
            self.material,
            self.length_mm,
            self.load_n,
            load_type,
            self.width_mm,
            self.height_mm,
        )
    }

    /// Whether the length falls within `tolerance_pct` percent of `length_mm`
    pub fn matches_length(&self, length_mm: f64, tolerance_pct: f64) -> bool {
        let band = length_mm * tolerance_pct / 100.0;
        (self.length_mm - length_mm).abs() <= band
    }
}

/// Efficiency of a historical alternative against the current design
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Efficiency {
    /// Positive when the alternative uses less material
    pub volume_saved_pct: f64,

    /// Alternative minus current deflection, when the row records one
    pub deflection_delta_mm: Option<f64>,
}

/// Best historical alternative with its efficiency figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub alternative: HistoricalDesign,
    pub efficiency: Efficiency,
}

impl Comparison {
    pub fn is_optimized_design(&self) -> bool {
        self.alternative.provenance == Provenance::Optimized
    }
}

/// What the history step produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ComparisonOutcome {
    Found(Comparison),
    NoAlternative,
    Unavailable { reason: String },
}
