//! `;`-delimited row format of the historical corpus.
//!
//! ```text
//! material;length_mm;load_n;width_mm;height_mm;volume_mm3;deflection_mm;status;provenance;recorded_at
//! Steel;6000;20000;200;300;360000000;0.83;PASS;original;
//! ```
//!
//! `deflection_mm`, `provenance` and `recorded_at` may be empty. The legacy
//! status `OPT` marks an optimized design and reads as `PASS` + `optimized`.

use beamdesign_core::error::{BeamdesignError, Result};
use beamdesign_core::models::{DesignStatus, HistoricalDesign, Material, Provenance};
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::Path;

pub const DELIMITER: char = ';';

pub const COLUMNS: [&str; 10] = [
    "material",
    "length_mm",
    "load_n",
    "width_mm",
    "height_mm",
    "volume_mm3",
    "deflection_mm",
    "status",
    "provenance",
    "recorded_at",
];

pub fn header_line() -> String {
    COLUMNS.join(";")
}

/// Check the header line; column names are compared case-insensitively
pub fn check_header(line: &str) -> std::result::Result<(), String> {
    let line = line.trim_start_matches('\u{feff}').trim();
    let columns: Vec<String> = line.split(DELIMITER).map(|c| c.trim().to_lowercase()).collect();

    if columns.len() != COLUMNS.len() {
        return Err(format!(
            "expected {} columns in header, found {}",
            COLUMNS.len(),
            columns.len()
        ));
    }
    for (found, expected) in columns.iter().zip(COLUMNS) {
        if found != expected {
            return Err(format!("expected column '{}', found '{}'", expected, found));
        }
    }
    Ok(())
}

/// Parse a whole corpus file.
///
/// An empty file is an empty corpus. Malformed data rows are skipped with a
/// warning; a malformed header fails the whole load.
pub fn parse_corpus(content: &str, path: &Path) -> Result<Vec<HistoricalDesign>> {
    let mut lines = content.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());

    let Some((_, header)) = lines.next() else {
        return Ok(Vec::new());
    };
    check_header(header).map_err(|reason| BeamdesignError::resource(path, reason))?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for (idx, line) in lines {
        match parse_row(line) {
            Ok(row) => rows.push(row),
            Err(reason) => {
                skipped += 1;
                tracing::warn!(
                    path = %path.display(),
                    line = idx + 1,
                    "Skipping malformed corpus row: {}",
                    reason
                );
            }
        }
    }

    if skipped > 0 {
        tracing::info!(path = %path.display(), kept = rows.len(), skipped, "Corpus loaded with skipped rows");
    }
    Ok(rows)
}

/// Parse one data row
pub fn parse_row(line: &str) -> std::result::Result<HistoricalDesign, String> {
    let fields: Vec<&str> = line.trim_end_matches('\r').split(DELIMITER).map(str::trim).collect();
    if fields.len() != COLUMNS.len() {
        return Err(format!("expected {} fields, found {}", COLUMNS.len(), fields.len()));
    }

    let material: Material = fields[0].parse().map_err(|e: BeamdesignError| e.to_string())?;
    let number = |idx: usize| -> std::result::Result<f64, String> {
        fields[idx]
            .parse::<f64>()
            .map_err(|_| format!("{} is not a number: '{}'", COLUMNS[idx], fields[idx]))
    };

    let deflection_mm = if fields[6].is_empty() { None } else { Some(number(6)?) };

    let (status, legacy_optimized) = match fields[7].to_uppercase().as_str() {
        "PASS" => (DesignStatus::Pass, false),
        "FAIL" => (DesignStatus::Fail, false),
        "OPT" => (DesignStatus::Pass, true),
        other => return Err(format!("unknown status '{}'", other)),
    };

    let provenance = match fields[8].to_lowercase().as_str() {
        _ if legacy_optimized => Provenance::Optimized,
        "" | "original" => Provenance::Original,
        "optimized" => Provenance::Optimized,
        other => return Err(format!("unknown provenance '{}'", other)),
    };

    let recorded_at = if fields[9].is_empty() {
        None
    } else {
        let parsed = DateTime::parse_from_rfc3339(fields[9])
            .map_err(|e| format!("bad recorded_at '{}': {}", fields[9], e))?;
        Some(parsed.with_timezone(&Utc))
    };

    let row = HistoricalDesign {
        material,
        length_mm: number(1)?,
        load_n: number(2)?,
        width_mm: number(3)?,
        height_mm: number(4)?,
        volume_mm3: number(5)?,
        deflection_mm,
        status,
        provenance,
        recorded_at,
    };
    row.validate().map_err(|e| e.to_string())?;
    Ok(row)
}

/// Format one data row, without the line terminator
pub fn format_row(row: &HistoricalDesign) -> String {
    let deflection = row.deflection_mm.map(|d| d.to_string()).unwrap_or_default();
    let recorded_at = row
        .recorded_at
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default();

    [
        row.material.to_string(),
        row.length_mm.to_string(),
        row.load_n.to_string(),
        row.width_mm.to_string(),
        row.height_mm.to_string(),
        row.volume_mm3.to_string(),
        deflection,
        row.status.to_string(),
        row.provenance.to_string(),
        recorded_at,
    ]
    .join(";")
}
