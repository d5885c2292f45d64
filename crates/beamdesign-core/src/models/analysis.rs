use serde::{Deserialize, Serialize};
use std::fmt;

/// Serviceability verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DesignStatus {
    Pass,
    Fail,
}

impl DesignStatus {
    /// Pass iff the deflection does not exceed the limit
    pub fn evaluate(deflection_mm: f64, limit_mm: f64) -> Self {
        if deflection_mm <= limit_mm {
            DesignStatus::Pass
        } else {
            DesignStatus::Fail
        }
    }

    pub fn is_pass(self) -> bool {
        self == DesignStatus::Pass
    }
}

impl fmt::Display for DesignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DesignStatus::Pass => f.write_str("PASS"),
            DesignStatus::Fail => f.write_str("FAIL"),
        }
    }
}

/// Which estimator produced a deflection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisSource {
    Model,
    Physics,
}

impl fmt::Display for AnalysisSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisSource::Model => f.write_str("model"),
            AnalysisSource::Physics => f.write_str("physics"),
        }
    }
}

/// Outcome of a single deflection analysis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Predicted midspan deflection
    pub deflection_mm: f64,

    /// Allowable deflection (span / 240)
    pub limit_mm: f64,

    pub status: DesignStatus,

    pub source: AnalysisSource,

    /// Beam volume, length × width × height
    pub volume_mm3: f64,
}

impl AnalysisResult {
    pub fn new(deflection_mm: f64, limit_mm: f64, source: AnalysisSource, volume_mm3: f64) -> Self {
        Self {
            deflection_mm,
            limit_mm,
            status: DesignStatus::evaluate(deflection_mm, limit_mm),
            source,
            volume_mm3,
        }
    }

    /// Utilisation of the serviceability limit, in percent
    pub fn utilisation_pct(&self) -> f64 {
        self.deflection_mm / self.limit_mm * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_boundary_is_pass() {
        assert_eq!(DesignStatus::evaluate(25.0, 25.0), DesignStatus::Pass);
        assert_eq!(DesignStatus::evaluate(25.0001, 25.0), DesignStatus::Fail);
    }

    #[test]
    fn test_result_derives_status() {
        let result = AnalysisResult::new(27.0, 25.0, AnalysisSource::Physics, 1.0);
        assert_eq!(result.status, DesignStatus::Fail);
        assert!((result.utilisation_pct() - 108.0).abs() < 1e-9);
    }
}
