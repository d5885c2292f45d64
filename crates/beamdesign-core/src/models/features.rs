use serde::{Deserialize, Serialize};

use super::beam::BeamDesign;

/// Number of engineered features fed to the deflection model
pub const FEATURE_COUNT: usize = 14;

/// Feature names, in the order the model was trained on
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "length_mm",
    "height_mm",
    "width_mm",
    "material_code",
    "cross_sectional_area",
    "second_moment_area",
    "length_cubed",
    "aspect_ratio",
    "width_height_ratio",
    "deflection_factor",
    "slenderness",
    "length_height_interaction",
    "length_width_interaction",
    "height_width_interaction",
];

/// Engineered geometric/material features of a design
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn from_design(design: &BeamDesign) -> Self {
        let l = design.length_mm;
        let h = design.height_mm;
        let w = design.width_mm;
        let area = w * h;
        let inertia = w * h.powi(3) / 12.0;
        let length_cubed = l.powi(3);

        Self([
            l,
            h,
            w,
            design.material.label_code(),
            area,
            inertia,
            length_cubed,
            l / h,
            w / h,
            length_cubed / inertia,
            l / area.sqrt(),
            l * h,
            l * w,
            h * w,
        ])
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES.iter().position(|n| *n == name).map(|idx| self.0[idx])
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LoadType, Material};

    #[test]
    fn test_feature_engineering() {
        let design =
            BeamDesign::new(Material::Wood, 4000.0, 12000.0, LoadType::Point, 100.0, 200.0).unwrap();
        let features = FeatureVector::from_design(&design);

        assert_eq!(features.get("material_code"), Some(2.0));
        assert_eq!(features.get("cross_sectional_area"), Some(20_000.0));
        assert_eq!(features.get("aspect_ratio"), Some(20.0));
        assert_eq!(features.get("width_height_ratio"), Some(0.5));
        assert_eq!(features.get("length_width_interaction"), Some(400_000.0));
        assert!(features.is_finite());
        assert_eq!(features.get("unknown"), None);
    }
}
