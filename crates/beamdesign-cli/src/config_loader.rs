//! Configuration loading utilities for CLI commands

use crate::cli::Cli;
use anyhow::{Context, Result};
use beamdesign_core::config::{validate_tolerance, CliConfigOverrides, LayeredConfig};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "beamdesign.toml";

/// Load layered configuration: defaults, then file, then environment
pub fn load_config(config_path: Option<&Path>) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    match config_path {
        Some(path) => {
            config = config
                .load_from_file(path)
                .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
        }
        None => {
            let implicit = PathBuf::from(DEFAULT_CONFIG_FILE);
            if implicit.is_file() {
                config = config
                    .load_from_file(&implicit)
                    .context("Failed to load configuration file")?;
            }
        }
    }

    Ok(config.load_from_env())
}

/// Load layered configuration with CLI overrides
pub fn load_config_with_overrides(cli: &Cli) -> Result<LayeredConfig> {
    let mut config = load_config(cli.config.as_deref())?;
    config.update_from_cli(overrides_from(cli)?);
    Ok(config)
}

fn overrides_from(cli: &Cli) -> Result<CliConfigOverrides> {
    let length_tolerance_pct = cli
        .tolerance
        .map(validate_tolerance)
        .transpose()
        .context("Invalid --tolerance")?;

    Ok(CliConfigOverrides {
        corpus_path: cli.corpus.clone(),
        profiles_path: cli.profiles.clone(),
        model_path: cli.model.clone(),
        length_tolerance_pct,
    })
}
