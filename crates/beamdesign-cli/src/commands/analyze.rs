//! Analyze command implementation

use super::Services;
use crate::cli::AnalyzeArgs;
use crate::output::OutputWriter;
use crate::output_types::AnalyzeOutput;
use anyhow::Result;
use beamdesign_core::config::LayeredConfig;
use beamdesign_core::models::ComparisonOutcome;
use beamdesign_store::DesignCorpus;

pub async fn execute(args: AnalyzeArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let design = args.design.to_design()?;
    let services = Services::from_config(config, output);
    let analysis = services.analysis.analyze(&design)?;

    let comparison = if args.compare {
        Some(match services.corpus.load().await {
            Ok(rows) => match services.comparison.compare(&design, &analysis, &rows) {
                Some(found) => ComparisonOutcome::Found(found),
                None => ComparisonOutcome::NoAlternative,
            },
            Err(e) => ComparisonOutcome::Unavailable {
                reason: e.to_string(),
            },
        })
    } else {
        None
    };

    if output.is_json() {
        return output.result(AnalyzeOutput {
            design,
            analysis,
            utilisation_pct: analysis.utilisation_pct(),
            comparison,
        });
    }

    output.section("Beam");
    output.kv("Material", design.material);
    output.kv("Span", format!("{} mm", design.length_mm));
    output.kv("Load", format!("{} N ({})", design.load_n, design.load_type));
    output.kv("Section", format!("{} × {} mm", design.width_mm, design.height_mm));

    output.section("Deflection");
    output.kv("Deflection", format!("{:.2} mm", analysis.deflection_mm));
    output.kv("Limit (L/240)", format!("{:.2} mm", analysis.limit_mm));
    output.kv("Utilisation", format!("{:.0}%", analysis.utilisation_pct()));
    output.kv("Source", analysis.source);
    if analysis.status.is_pass() {
        output.success(format!("{}: within the serviceability limit", analysis.status));
    } else {
        output.error(format!("{}: exceeds the serviceability limit", analysis.status));
    }

    if let Some(outcome) = comparison {
        output.section("History");
        match outcome {
            ComparisonOutcome::Found(found) => {
                let alt = &found.alternative;
                output.kv(
                    "Best alternative",
                    format!(
                        "{} × {} mm ({}, {})",
                        alt.width_mm, alt.height_mm, alt.status, alt.provenance
                    ),
                );
                output.kv(
                    "Volume saved",
                    format!("{:.1}%", found.efficiency.volume_saved_pct),
                );
            }
            ComparisonOutcome::NoAlternative => {
                output.info("No passing design of this material and span on record")
            }
            ComparisonOutcome::Unavailable { reason } => {
                output.warning(format!("History unavailable: {}", reason))
            }
        }
    }

    Ok(())
}
