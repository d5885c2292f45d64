//! Closed-form midspan deflection of a simply supported beam.

use beamdesign_core::models::{BeamDesign, LoadType};

/// Deflection for a given second moment of area.
///
/// Point load at midspan: `P L³ / (48 E I)`.
/// Uniform load with total `P`: `5 P L³ / (384 E I)`.
pub fn deflection_with_inertia(design: &BeamDesign, inertia_mm4: f64) -> f64 {
    let e = design.material.elastic_modulus();
    let l3 = design.length_mm.powi(3);
    match design.load_type {
        LoadType::Point => design.load_n * l3 / (48.0 * e * inertia_mm4),
        LoadType::Distributed => 5.0 * design.load_n * l3 / (384.0 * e * inertia_mm4),
    }
}

/// Deflection of the rectangular section, mm
pub fn deflection_mm(design: &BeamDesign) -> f64 {
    deflection_with_inertia(design, design.second_moment_of_area())
}
