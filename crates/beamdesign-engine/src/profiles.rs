use beamdesign_core::models::{
    BeamDesign, DesignStatus, Material, ProfileRecommendation, SteelProfile,
};

use crate::physics;

/// Standard steel section suggestions for custom steel designs
#[derive(Debug, Clone, Default)]
pub struct ProfileAdvisor {
    profiles: Vec<SteelProfile>,
}

impl ProfileAdvisor {
    pub fn new(profiles: Vec<SteelProfile>) -> Self {
        Self { profiles }
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Profile whose height is closest to `height_mm`; lower profile on a tie
    pub fn nearest_by_height(&self, height_mm: f64) -> Option<&SteelProfile> {
        self.profiles.iter().min_by(|a, b| {
            let da = (a.height_mm - height_mm).abs();
            let db = (b.height_mm - height_mm).abs();
            da.total_cmp(&db).then(a.height_mm.total_cmp(&b.height_mm))
        })
    }

    /// Evaluate a profile in place of the design's rectangular section
    pub fn evaluate(&self, design: &BeamDesign, profile: &SteelProfile) -> ProfileRecommendation {
        let deflection_mm = physics::deflection_with_inertia(design, profile.moment_of_inertia_mm4);
        let volume_mm3 = profile.area_mm2 * design.length_mm;
        let custom = design.volume_mm3();

        ProfileRecommendation {
            profile: profile.clone(),
            volume_mm3,
            deflection_mm,
            status: DesignStatus::evaluate(deflection_mm, design.serviceability_limit_mm()),
            efficiency_gain_pct: (custom - volume_mm3) / custom * 100.0,
        }
    }

    /// Nearest profile by height to the optimized section. Steel only.
    pub fn snap(&self, design: &BeamDesign) -> Option<ProfileRecommendation> {
        if design.material != Material::Steel {
            return None;
        }
        self.nearest_by_height(design.height_mm)
            .map(|profile| self.evaluate(design, profile))
    }

    /// Lightest passing profile, only when it uses less material than the
    /// custom section. Steel only.
    pub fn more_efficient_standard(&self, design: &BeamDesign) -> Option<ProfileRecommendation> {
        if design.material != Material::Steel {
            return None;
        }
        self.profiles
            .iter()
            .map(|profile| self.evaluate(design, profile))
            .filter(|rec| rec.status.is_pass() && rec.efficiency_gain_pct > 0.0)
            .min_by(|a, b| a.volume_mm3.total_cmp(&b.volume_mm3))
    }
}
