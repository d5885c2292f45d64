use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{BeamdesignError, Result};

/// Industry serviceability ratio: allowable deflection is span / 240.
pub const SERVICEABILITY_RATIO: f64 = 240.0;

/// Smallest admissible cross-section dimension in millimetres.
pub const MIN_SECTION_MM: f64 = 10.0;

/// Beam material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Material {
    Steel,
    Wood,
    Concrete,
}

impl Material {
    pub const ALL: [Material; 3] = [Material::Steel, Material::Wood, Material::Concrete];

    /// Elastic modulus in N/mm²
    pub fn elastic_modulus(self) -> f64 {
        match self {
            Material::Steel => 200_000.0,
            Material::Wood => 11_000.0,
            Material::Concrete => 30_000.0,
        }
    }

    /// Label code used as a model feature (alphabetical label encoding)
    pub fn label_code(self) -> f64 {
        match self {
            Material::Concrete => 0.0,
            Material::Steel => 1.0,
            Material::Wood => 2.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Material::Steel => "Steel",
            Material::Wood => "Wood",
            Material::Concrete => "Concrete",
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Material {
    type Err = BeamdesignError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "steel" | "stahl" => Ok(Material::Steel),
            "wood" | "timber" | "holz" => Ok(Material::Wood),
            "concrete" | "beton" => Ok(Material::Concrete),
            other => Err(BeamdesignError::validation(
                SpecField::Material.key(),
                format!("unknown material '{}'. Use Steel, Wood, or Concrete", other),
            )),
        }
    }
}

/// How the load is applied along the span
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadType {
    /// Single load at midspan
    #[default]
    Point,
    /// Total load spread uniformly over the span
    Distributed,
}

impl fmt::Display for LoadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadType::Point => f.write_str("point"),
            LoadType::Distributed => f.write_str("distributed"),
        }
    }
}

impl FromStr for LoadType {
    type Err = BeamdesignError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "point" | "concentrated" | "punkt" | "punktlast" | "einzellast" => Ok(LoadType::Point),
            "distributed" | "uniform" | "udl" | "verteilt" | "streckenlast" | "flächenlast" => {
                Ok(LoadType::Distributed)
            }
            other => Err(BeamdesignError::validation(
                "load_type",
                format!("unknown load type '{}'. Use point or distributed", other),
            )),
        }
    }
}

/// Required specification fields, in prompting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecField {
    Material,
    Length,
    Load,
    Width,
    Height,
}

impl SpecField {
    pub const REQUIRED: [SpecField; 5] = [
        SpecField::Material,
        SpecField::Length,
        SpecField::Load,
        SpecField::Width,
        SpecField::Height,
    ];

    /// Column/field key as used in uploads and the corpus
    pub fn key(self) -> &'static str {
        match self {
            SpecField::Material => "material",
            SpecField::Length => "length_mm",
            SpecField::Load => "load_n",
            SpecField::Width => "width_mm",
            SpecField::Height => "height_mm",
        }
    }
}

impl fmt::Display for SpecField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Loosely typed fields as produced by an extractor.
///
/// Nothing here is trusted: values are validated when merged into a
/// [`BeamSpecification`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub material: Option<String>,
    pub length_mm: Option<f64>,
    pub load_n: Option<f64>,
    pub load_type: Option<String>,
    pub width_mm: Option<f64>,
    pub height_mm: Option<f64>,
}

impl ExtractedFields {
    pub fn is_empty(&self) -> bool {
        self.material.is_none()
            && self.length_mm.is_none()
            && self.load_n.is_none()
            && self.load_type.is_none()
            && self.width_mm.is_none()
            && self.height_mm.is_none()
    }

    /// Overlay `other` on top of `self`; fields present in `other` win.
    pub fn overlay(mut self, other: ExtractedFields) -> Self {
        if other.material.is_some() {
            self.material = other.material;
        }
        if other.length_mm.is_some() {
            self.length_mm = other.length_mm;
        }
        if other.load_n.is_some() {
            self.load_n = other.load_n;
        }
        if other.load_type.is_some() {
            self.load_type = other.load_type;
        }
        if other.width_mm.is_some() {
            self.width_mm = other.width_mm;
        }
        if other.height_mm.is_some() {
            self.height_mm = other.height_mm;
        }
        self
    }
}

/// A rejected field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: String,
    pub reason: String,
}

impl From<BeamdesignError> for FieldIssue {
    fn from(err: BeamdesignError) -> Self {
        match err {
            BeamdesignError::Validation { field, reason } => FieldIssue { field, reason },
            other => FieldIssue {
                field: "specification".to_string(),
                reason: other.to_string(),
            },
        }
    }
}

/// The evolving design request gathered over a conversation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeamSpecification {
    pub material: Option<Material>,
    pub length_mm: Option<f64>,
    pub load_n: Option<f64>,
    #[serde(default)]
    pub load_type: LoadType,
    pub width_mm: Option<f64>,
    pub height_mm: Option<f64>,
}

impl BeamSpecification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge extracted fields, last write wins per field.
    ///
    /// Invalid values are left out of the specification and reported back.
    pub fn merge(&mut self, fields: &ExtractedFields) -> Vec<FieldIssue> {
        let mut issues = Vec::new();

        if let Some(raw) = &fields.material {
            match raw.parse::<Material>() {
                Ok(material) => self.material = Some(material),
                Err(e) => issues.push(e.into()),
            }
        }

        if let Some(raw) = &fields.load_type {
            match raw.parse::<LoadType>() {
                Ok(load_type) => self.load_type = load_type,
                Err(e) => issues.push(e.into()),
            }
        }

        let numeric = [
            (SpecField::Length, fields.length_mm, &mut self.length_mm),
            (SpecField::Load, fields.load_n, &mut self.load_n),
            (SpecField::Width, fields.width_mm, &mut self.width_mm),
            (SpecField::Height, fields.height_mm, &mut self.height_mm),
        ];
        for (field, value, slot) in numeric {
            if let Some(value) = value {
                match positive(field, value) {
                    Ok(v) => *slot = Some(v),
                    Err(e) => issues.push(e.into()),
                }
            }
        }

        issues
    }

    /// Required fields still absent, in prompting order
    pub fn missing_fields(&self) -> Vec<SpecField> {
        SpecField::REQUIRED
            .into_iter()
            .filter(|field| match field {
                SpecField::Material => self.material.is_none(),
                SpecField::Length => self.length_mm.is_none(),
                SpecField::Load => self.load_n.is_none(),
                SpecField::Width => self.width_mm.is_none(),
                SpecField::Height => self.height_mm.is_none(),
            })
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.to_design().is_ok()
    }

    /// Convert into a complete, validated design
    pub fn to_design(&self) -> Result<BeamDesign> {
        let missing = |field: SpecField| BeamdesignError::validation(field.key(), "missing");
        BeamDesign::new(
            self.material.ok_or_else(|| missing(SpecField::Material))?,
            self.length_mm.ok_or_else(|| missing(SpecField::Length))?,
            self.load_n.ok_or_else(|| missing(SpecField::Load))?,
            self.load_type,
            self.width_mm.ok_or_else(|| missing(SpecField::Width))?,
            self.height_mm.ok_or_else(|| missing(SpecField::Height))?,
        )
    }
}

/// A complete beam specification, handed to the engines by value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeamDesign {
    pub material: Material,
    pub length_mm: f64,
    pub load_n: f64,
    pub load_type: LoadType,
    pub width_mm: f64,
    pub height_mm: f64,
}

impl BeamDesign {
    pub fn new(
        material: Material,
        length_mm: f64,
        load_n: f64,
        load_type: LoadType,
        width_mm: f64,
        height_mm: f64,
    ) -> Result<Self> {
        let design = Self {
            material,
            length_mm,
            load_n,
            load_type,
            width_mm,
            height_mm,
        };
        design.validate()?;
        Ok(design)
    }

    /// Reject non-positive or non-finite values
    pub fn validate(&self) -> Result<()> {
        positive(SpecField::Length, self.length_mm)?;
        positive(SpecField::Load, self.load_n)?;
        positive(SpecField::Width, self.width_mm)?;
        positive(SpecField::Height, self.height_mm)?;
        Ok(())
    }

    /// Same beam with a different cross-section
    pub fn with_section(&self, width_mm: f64, height_mm: f64) -> Self {
        Self {
            width_mm,
            height_mm,
            ..*self
        }
    }

    pub fn cross_sectional_area(&self) -> f64 {
        self.width_mm * self.height_mm
    }

    /// Second moment of area of the rectangular section, mm⁴
    pub fn second_moment_of_area(&self) -> f64 {
        self.width_mm * self.height_mm.powi(3) / 12.0
    }

    pub fn volume_mm3(&self) -> f64 {
        self.length_mm * self.width_mm * self.height_mm
    }

    /// Allowable deflection, span / 240
    pub fn serviceability_limit_mm(&self) -> f64 {
        self.length_mm / SERVICEABILITY_RATIO
    }

    pub fn to_specification(&self) -> BeamSpecification {
        BeamSpecification {
            material: Some(self.material),
            length_mm: Some(self.length_mm),
            load_n: Some(self.load_n),
            load_type: self.load_type,
            width_mm: Some(self.width_mm),
            height_mm: Some(self.height_mm),
        }
    }
}

fn positive(field: SpecField, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(BeamdesignError::validation(field.key(), "must be a finite number"));
    }
    if value <= 0.0 {
        return Err(BeamdesignError::validation(
            field.key(),
            format!("must be positive, got {}", value),
        ));
    }
    Ok(value)
}
