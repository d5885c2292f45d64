//! Standard steel profile table.
//!
//! ```text
//! profile;height_mm;width_mm;moment_of_inertia_mm4;area_mm2
//! IPE 200;200;100;19430000;2848
//! ```

use beamdesign_core::error::{BeamdesignError, Result};
use beamdesign_core::models::SteelProfile;
use std::fs;
use std::path::Path;

const COLUMNS: [&str; 5] = ["profile", "height_mm", "width_mm", "moment_of_inertia_mm4", "area_mm2"];

/// Steel profiles ordered by height
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileCatalog {
    profiles: Vec<SteelProfile>,
}

impl ProfileCatalog {
    pub fn from_profiles(mut profiles: Vec<SteelProfile>) -> Self {
        profiles.sort_by(|a, b| a.height_mm.total_cmp(&b.height_mm));
        Self { profiles }
    }

    /// Load the table from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| BeamdesignError::resource(path, e.to_string()))?;
        Self::parse(&content, path)
    }

    /// Parse table content. Malformed rows are skipped with a warning.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let mut lines = content.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());

        let (_, header) = lines
            .next()
            .ok_or_else(|| BeamdesignError::resource(path, "profile table is empty"))?;
        let columns: Vec<String> = header
            .trim_start_matches('\u{feff}')
            .split(';')
            .map(|c| c.trim().to_lowercase())
            .collect();
        if columns != COLUMNS {
            return Err(BeamdesignError::resource(
                path,
                format!("unexpected profile header '{}'", header.trim()),
            ));
        }

        let mut profiles = Vec::new();
        for (idx, line) in lines {
            match parse_profile(line) {
                Ok(profile) => profiles.push(profile),
                Err(reason) => tracing::warn!(
                    path = %path.display(),
                    line = idx + 1,
                    "Skipping malformed profile row: {}",
                    reason
                ),
            }
        }

        tracing::debug!(path = %path.display(), profiles = profiles.len(), "Loaded steel profiles");
        Ok(Self::from_profiles(profiles))
    }

    pub fn profiles(&self) -> &[SteelProfile] {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn parse_profile(line: &str) -> std::result::Result<SteelProfile, String> {
    let fields: Vec<&str> = line.split(';').map(str::trim).collect();
    if fields.len() != COLUMNS.len() {
        return Err(format!("expected {} fields, found {}", COLUMNS.len(), fields.len()));
    }
    if fields[0].is_empty() {
        return Err("missing profile name".to_string());
    }

    let number = |idx: usize| -> std::result::Result<f64, String> {
        match fields[idx].parse::<f64>() {
            Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
            _ => Err(format!("{} must be a positive number, got '{}'", COLUMNS[idx], fields[idx])),
        }
    };

    Ok(SteelProfile {
        name: fields[0].to_string(),
        height_mm: number(1)?,
        width_mm: number(2)?,
        moment_of_inertia_mm4: number(3)?,
        area_mm2: number(4)?,
    })
}
