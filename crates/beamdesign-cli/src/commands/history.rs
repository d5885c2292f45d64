//! History command implementation

use super::{parse_material, Services};
use crate::cli::HistoryArgs;
use crate::output::OutputWriter;
use crate::output_types::HistoryRow;
use anyhow::{Context, Result};
use beamdesign_core::config::LayeredConfig;
use beamdesign_store::DesignCorpus;

pub async fn execute(args: HistoryArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let material = args.material.as_deref().map(parse_material).transpose()?;
    let services = Services::from_config(config, output);
    let tolerance = services.comparison.tolerance_pct();

    let rows = services
        .corpus
        .load()
        .await
        .with_context(|| format!("Failed to read {}", services.corpus.describe()))?;
    let total = rows.len();

    let selected: Vec<HistoryRow> = rows
        .iter()
        .filter(|row| material.map_or(true, |m| row.material == m))
        .filter(|row| args.length.map_or(true, |l| row.matches_length(l, tolerance)))
        .filter(|row| !args.passing || row.status.is_pass())
        .map(HistoryRow::from)
        .collect();

    if !output.is_json() {
        output.section(format!("Historical designs ({})", services.corpus.describe()));
        output.info(format!("{} of {} rows", selected.len(), total));
    }
    output.table(selected)
}
