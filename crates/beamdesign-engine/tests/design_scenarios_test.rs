//! End-to-end engine checks on the reference steel beam
//!
//! Steel, 6 m span, 20 kN point load at mid-span, 200 mm wide, 100 mm tall.

use beamdesign_core::config::OptimizerSettings;
use beamdesign_core::models::{
    AnalysisSource, BaselineKind, BeamDesign, DesignStatus, HistoricalDesign, LoadType, Material,
    Provenance, SteelProfile,
};
use beamdesign_core::BeamdesignError;
use beamdesign_engine::{AnalysisEngine, ComparisonEngine, OptimizationEngine, ProfileAdvisor};
use chrono::Utc;
use std::sync::Arc;

fn reference_beam() -> BeamDesign {
    BeamDesign::new(Material::Steel, 6000.0, 20000.0, LoadType::Point, 200.0, 100.0).unwrap()
}

fn engine() -> OptimizationEngine {
    OptimizationEngine::new(Arc::new(AnalysisEngine::physics_only()), OptimizerSettings::default())
}

#[test]
fn test_reference_beam_fails_serviceability() {
    let analysis = AnalysisEngine::physics_only().analyze(&reference_beam()).unwrap();

    assert!((analysis.deflection_mm - 27.0).abs() < 1e-9);
    assert!((analysis.limit_mm - 25.0).abs() < 1e-12);
    assert_eq!(analysis.status, DesignStatus::Fail);
    assert_eq!(analysis.source, AnalysisSource::Physics);
}

#[test]
fn test_optimized_reference_beam_passes_with_large_saving() {
    let result = engine().optimize(&reference_beam(), &[]).unwrap();

    let check = AnalysisEngine::physics_only().analyze(&result.specification).unwrap();
    assert_eq!(check.status, DesignStatus::Pass);
    assert_eq!(result.baseline.kind, BaselineKind::NaiveUpsized);
    assert!(result.volume_saved_pct > 80.0, "saved {}", result.volume_saved_pct);
    assert!(result.specification.width_mm >= 10.0);
    assert!(result.specification.height_mm >= 10.0);
    // material, span and load never change
    assert_eq!(result.specification.material, Material::Steel);
    assert_eq!(result.specification.length_mm, 6000.0);
    assert_eq!(result.specification.load_n, 20000.0);
}

#[test]
fn test_optimized_steel_gets_profile_suggestions() {
    let profiles = vec![
        SteelProfile {
            name: "IPE 270".to_string(),
            height_mm: 270.0,
            width_mm: 135.0,
            moment_of_inertia_mm4: 57.90e6,
            area_mm2: 4595.0,
        },
        SteelProfile {
            name: "IPE 300".to_string(),
            height_mm: 300.0,
            width_mm: 150.0,
            moment_of_inertia_mm4: 83.56e6,
            area_mm2: 5381.0,
        },
    ];
    let result = engine()
        .with_profiles(ProfileAdvisor::new(profiles))
        .optimize(&reference_beam(), &[])
        .unwrap();

    let snapped = result.snapped_profile.expect("nearest profile");
    assert_eq!(snapped.profile.name, "IPE 270");
    // an I-section is stiffer per unit area than the solid optimum but heavier here
    assert!(result.standard_alternative.is_none());
}

#[test]
fn test_optimized_row_is_a_valid_comparison_candidate() {
    let result = engine().optimize(&reference_beam(), &[]).unwrap();
    let row = HistoricalDesign::optimized(&result.specification, result.deflection_mm, Utc::now());
    assert_eq!(row.provenance, Provenance::Optimized);

    let analysis = AnalysisEngine::physics_only().analyze(&reference_beam()).unwrap();
    let comparison = ComparisonEngine::default()
        .compare(&reference_beam(), &analysis, &[row])
        .unwrap();
    assert!(comparison.is_optimized_design());
    assert!(comparison.efficiency.volume_saved_pct > 80.0);
}

#[test]
fn test_unreachable_limit_is_reported_with_attempts() {
    let design =
        BeamDesign::new(Material::Wood, 12000.0, 5.0e6, LoadType::Point, 20.0, 20.0).unwrap();
    let err = engine().optimize(&design, &[]).unwrap_err();

    match err {
        BeamdesignError::OptimizationInfeasible(failure) => {
            assert!(!failure.attempts.is_empty());
            assert!(failure.attempts.iter().all(|a| !a.converged));
        }
        other => panic!("unexpected error {}", other),
    }
}
