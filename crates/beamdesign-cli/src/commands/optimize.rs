//! Optimize command implementation

use super::Services;
use crate::cli::OptimizeArgs;
use crate::output::OutputWriter;
use crate::output_types::{AttemptRow, OptimizeOutput};
use anyhow::{bail, Context, Result};
use beamdesign_core::config::LayeredConfig;
use beamdesign_core::error::BeamdesignError;
use beamdesign_core::models::{BaselineKind, HistoricalDesign};
use beamdesign_store::DesignCorpus;

pub async fn execute(args: OptimizeArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let design = args.design.to_design()?;
    let services = Services::from_config(config, output);
    let input_analysis = services.analysis.analyze(&design)?;

    // A missing corpus only costs the multi-start seed
    let rows = match services.corpus.load().await {
        Ok(rows) => rows,
        Err(e) => {
            output.warning(format!("Corpus unavailable, searching without history: {}", e));
            Vec::new()
        }
    };

    let optimizer = services.optimizer.clone();
    let outcome = tokio::task::spawn_blocking(move || optimizer.optimize(&design, &rows))
        .await
        .context("Optimization task failed")?;

    let result = match outcome {
        Ok(result) => result,
        Err(BeamdesignError::OptimizationInfeasible(failure)) => {
            if !output.is_json() {
                output.section("Attempts");
                output.table(failure.attempts.iter().map(AttemptRow::from).collect())?;
            }
            bail!("{}", failure);
        }
        Err(e) => return Err(e).context("Optimization failed"),
    };

    let persisted = if args.persist {
        let row = HistoricalDesign::optimized(
            &result.specification,
            result.deflection_mm,
            chrono::Utc::now(),
        );
        services
            .corpus
            .append(&row)
            .await
            .with_context(|| format!("Failed to append to {}", services.corpus.describe()))?;
        true
    } else {
        false
    };

    if output.is_json() {
        return output.result(OptimizeOutput {
            input: design,
            input_analysis,
            result,
            persisted,
        });
    }

    output.section("Optimized section");
    output.kv(
        "Section",
        format!(
            "{:.1} × {:.1} mm",
            result.specification.width_mm, result.specification.height_mm
        ),
    );
    output.kv("Volume", format!("{:.0} mm³", result.volume_mm3));
    output.kv(
        "Deflection",
        format!("{:.2} mm (limit {:.2} mm)", result.deflection_mm, result.limit_mm),
    );
    output.kv("Strategy", result.strategy_used);
    output.kv("Category", format!("{:?}", result.category));

    let baseline = match result.baseline.kind {
        BaselineKind::Input => "submitted design".to_string(),
        BaselineKind::NaiveUpsized => format!(
            "submitted section scaled to {:.1} × {:.1} mm",
            result.baseline.width_mm, result.baseline.height_mm
        ),
    };
    output.kv(
        "Volume saved",
        format!("{:.1}% against the {}", result.volume_saved_pct, baseline),
    );
    output.kv(
        "Change vs. input",
        format!(
            "{:+.1}% (input deflection {:.2} mm)",
            result.volume_change_vs_input_pct, input_analysis.deflection_mm
        ),
    );

    if let Some(snapped) = &result.snapped_profile {
        output.section("Standard profiles");
        output.kv(
            "Nearest by height",
            format!(
                "{} ({}, {:.2} mm)",
                snapped.profile.name, snapped.status, snapped.deflection_mm
            ),
        );
        match &result.standard_alternative {
            Some(standard) => output.kv(
                "Lighter standard section",
                format!(
                    "{} saves {:.1}%",
                    standard.profile.name, standard.efficiency_gain_pct
                ),
            ),
            None => output.info("No standard profile beats the custom section"),
        }
    }

    output.section("Attempts");
    output.table(result.attempts.iter().map(AttemptRow::from).collect())?;

    if persisted {
        output.success(format!("Recorded in {}", services.corpus.describe()));
    }
    Ok(())
}
