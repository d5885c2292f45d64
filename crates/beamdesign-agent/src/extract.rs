//! Deterministic field extraction from key/value text and uploaded JSON.
//!
//! Understands `length=6m`, `load: 20kN`, `Höhe 200`, bare material and
//! load-type words in English and German, and uploaded objects such as
//! `{"Material": "Steel", "Length": "6 m"}`. Lengths accept `mm`, `cm` and
//! `m`; loads accept `N` and `kN`. Values found in the text override
//! uploaded ones.

use async_trait::async_trait;
use beamdesign_core::error::{BeamdesignError, Result};
use beamdesign_core::models::{ExtractedFields, LoadType, Material};
use beamdesign_core::ports::FieldExtractor;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Material,
    Length,
    Load,
    LoadType,
    Width,
    Height,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quantity {
    Length,
    Force,
}

impl Key {
    fn parse(raw: &str) -> Option<Self> {
        let key = raw.trim().to_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            "material" | "werkstoff" => Some(Key::Material),
            "length" | "length_mm" | "länge" | "laenge" | "span" | "spannweite" => Some(Key::Length),
            "load" | "load_n" | "last" | "force" | "kraft" => Some(Key::Load),
            "load_type" | "loadtype" | "lastart" => Some(Key::LoadType),
            "width" | "width_mm" | "breite" | "b" => Some(Key::Width),
            "height" | "height_mm" | "höhe" | "hoehe" | "h" => Some(Key::Height),
            _ => None,
        }
    }

    fn quantity(self) -> Option<Quantity> {
        match self {
            Key::Length | Key::Width | Key::Height => Some(Quantity::Length),
            Key::Load => Some(Quantity::Force),
            Key::Material | Key::LoadType => None,
        }
    }
}

/// Parse `"6m"`, `"6 m"`, `"20kN"` or `"200"` into mm or N
fn parse_quantity(quantity: Quantity, raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+')))
        .unwrap_or(raw.len());
    let (number, unit) = raw.split_at(split);
    let value: f64 = number.parse().ok()?;

    let factor = match (quantity, unit.trim().to_lowercase().as_str()) {
        (Quantity::Length, "" | "mm") => 1.0,
        (Quantity::Length, "cm") => 10.0,
        (Quantity::Length, "m") => 1000.0,
        (Quantity::Force, "" | "n") => 1.0,
        (Quantity::Force, "kn") => 1000.0,
        _ => return None,
    };
    Some(value * factor)
}

fn is_unit(token: &str) -> bool {
    matches!(token, "mm" | "cm" | "m" | "n" | "kn")
}

fn starts_numeric(token: &str) -> bool {
    token
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '.' || c == '-')
}

/// Store a value for `key`. Unreadable numbers are passed on as NaN so the
/// specification merge rejects the field and it is asked for again.
fn assign(fields: &mut ExtractedFields, key: Key, raw: &str) {
    let numeric = |q: Quantity| Some(parse_quantity(q, raw).unwrap_or(f64::NAN));
    match key {
        Key::Material => fields.material = Some(raw.trim().to_string()),
        Key::LoadType => fields.load_type = Some(raw.trim().to_string()),
        Key::Length => fields.length_mm = numeric(Quantity::Length),
        Key::Load => fields.load_n = numeric(Quantity::Force),
        Key::Width => fields.width_mm = numeric(Quantity::Length),
        Key::Height => fields.height_mm = numeric(Quantity::Length),
    }
}

/// Lowercase, turn separators into spaces and `=`/`:` into their own
/// token. A comma between digits is a decimal comma.
fn tokenize(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.to_lowercase().chars().collect();
    let mut normalized = String::with_capacity(chars.len() + 8);
    for (i, &c) in chars.iter().enumerate() {
        let between_digits = i > 0
            && i + 1 < chars.len()
            && chars[i - 1].is_ascii_digit()
            && chars[i + 1].is_ascii_digit();
        match c {
            ',' if between_digits => normalized.push('.'),
            ',' | ';' | '(' | ')' | '"' | '\'' => normalized.push(' '),
            '=' | ':' => normalized.push_str(" = "),
            c if c.is_whitespace() => normalized.push(' '),
            c => normalized.push(c),
        }
    }
    normalized.split_whitespace().map(str::to_string).collect()
}

fn extract_text(text: &str) -> ExtractedFields {
    let tokens = tokenize(text);
    let mut fields = ExtractedFields::default();
    let mut material_word = None;
    let mut load_type_word = None;

    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        if let Some(key) = Key::parse(token) {
            let mut j = i + 1;
            if tokens.get(j).is_some_and(|t| t == "=") {
                j += 1;
            }
            if let Some(value) = tokens.get(j) {
                let explicit = j > i + 1;
                let takes_value = explicit || (key.quantity().is_some() && starts_numeric(value));
                if takes_value {
                    let mut raw = value.clone();
                    if key.quantity().is_some()
                        && value.parse::<f64>().is_ok()
                        && tokens.get(j + 1).is_some_and(|u| is_unit(u))
                    {
                        raw.push_str(&tokens[j + 1]);
                        j += 1;
                    }
                    assign(&mut fields, key, &raw);
                    i = j + 1;
                    continue;
                }
            }
        }

        if material_word.is_none() && token.parse::<Material>().is_ok() {
            material_word = Some(token.to_string());
        }
        if load_type_word.is_none() && token.parse::<LoadType>().is_ok() {
            load_type_word = Some(token.to_string());
        }
        i += 1;
    }

    if fields.material.is_none() {
        fields.material = material_word;
    }
    if fields.load_type.is_none() {
        fields.load_type = load_type_word;
    }
    fields
}

fn extract_uploaded(uploaded: &Value) -> Result<ExtractedFields> {
    let object = uploaded.as_object().ok_or_else(|| {
        BeamdesignError::validation("upload", "uploaded fields must be a JSON object")
    })?;

    let mut fields = ExtractedFields::default();
    for (name, value) in object {
        let Some(key) = Key::parse(name) else {
            tracing::debug!(field = %name, "Ignoring unknown uploaded field");
            continue;
        };
        match value {
            Value::Null => {}
            Value::Number(n) => match n.as_f64() {
                Some(v) if key.quantity().is_some() => assign(&mut fields, key, &v.to_string()),
                _ => assign(&mut fields, key, &n.to_string()),
            },
            Value::String(s) => assign(&mut fields, key, s),
            other => assign(&mut fields, key, &other.to_string()),
        }
    }
    Ok(fields)
}

/// Local implementation of the extraction port
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFieldExtractor;

impl LocalFieldExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FieldExtractor for LocalFieldExtractor {
    async fn extract(&self, text: &str, uploaded: Option<&Value>) -> Result<ExtractedFields> {
        let from_upload = match uploaded {
            Some(value) => extract_uploaded(value)?,
            None => ExtractedFields::default(),
        };
        Ok(from_upload.overlay(extract_text(text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_value_pairs_with_units() {
        let fields = extract_text("material=steel, length=6m, load: 20kN, width=200, height = 10 cm");
        assert_eq!(fields.material.as_deref(), Some("steel"));
        assert_eq!(fields.length_mm, Some(6000.0));
        assert_eq!(fields.load_n, Some(20000.0));
        assert_eq!(fields.width_mm, Some(200.0));
        assert_eq!(fields.height_mm, Some(100.0));
    }

    #[test]
    fn test_german_words_and_decimal_comma() {
        let fields = extract_text("Holz, Länge 4,5 m, Last 8 kN Streckenlast, Breite 120 Höhe 240");
        assert_eq!(fields.material.as_deref(), Some("holz"));
        assert_eq!(fields.length_mm, Some(4500.0));
        assert_eq!(fields.load_n, Some(8000.0));
        assert_eq!(fields.load_type.as_deref(), Some("streckenlast"));
        assert_eq!(fields.width_mm, Some(120.0));
        assert_eq!(fields.height_mm, Some(240.0));
    }

    #[test]
    fn test_unreadable_values_become_nan() {
        let fields = extract_text("length=six");
        assert!(fields.length_mm.unwrap().is_nan());
        let fields = extract_text("load=20 furlongs");
        // a bare number is still read, the stray word is not a unit
        assert_eq!(fields.load_n, Some(20.0));
    }

    #[test]
    fn test_plain_prose_has_no_fields() {
        assert!(extract_text("yes please show me").is_empty());
        assert!(extract_text("").is_empty());
    }

    #[tokio::test]
    async fn test_text_overrides_upload() {
        let uploaded = json!({
            "Material": "Wood",
            "Length": "6 m",
            "Load": 20000,
            "Width": "20 cm",
            "Height": 100,
            "Comment": "ignored"
        });
        let fields = LocalFieldExtractor::new()
            .extract("height=150", Some(&uploaded))
            .await
            .unwrap();

        assert_eq!(fields.material.as_deref(), Some("Wood"));
        assert_eq!(fields.length_mm, Some(6000.0));
        assert_eq!(fields.load_n, Some(20000.0));
        assert_eq!(fields.width_mm, Some(200.0));
        assert_eq!(fields.height_mm, Some(150.0));
    }

    #[tokio::test]
    async fn test_non_object_upload_is_rejected() {
        let result = LocalFieldExtractor::new().extract("", Some(&json!([1, 2]))).await;
        assert!(matches!(result, Err(BeamdesignError::Validation { .. })));
    }
}
