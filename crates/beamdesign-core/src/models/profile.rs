use serde::{Deserialize, Serialize};

use super::analysis::DesignStatus;

/// A standard rolled steel section from the profile table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteelProfile {
    /// Designation, e.g. "IPE 300"
    pub name: String,
    pub height_mm: f64,
    /// Flange width
    pub width_mm: f64,
    pub moment_of_inertia_mm4: f64,
    pub area_mm2: f64,
}

/// A standard section proposed alongside a custom steel optimum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecommendation {
    pub profile: SteelProfile,
    pub volume_mm3: f64,
    pub deflection_mm: f64,
    pub status: DesignStatus,

    /// Volume saved against the custom section, percent (negative = heavier)
    pub efficiency_gain_pct: f64,
}
