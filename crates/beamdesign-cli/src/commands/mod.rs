//! Command implementations

mod analyze;
mod chat;
mod config;
mod history;
mod optimize;

use crate::cli::{Cli, Commands, DesignArgs, LoadTypeArg};
use crate::config_loader::load_config_with_overrides;
use crate::output::OutputWriter;
use anyhow::{Context, Result};
use beamdesign_core::config::LayeredConfig;
use beamdesign_core::models::{BeamDesign, LoadType, Material};
use beamdesign_core::ports::ModelLoader;
use beamdesign_engine::{
    AnalysisEngine, ComparisonEngine, JsonModelLoader, OptimizationEngine, ProfileAdvisor,
};
use beamdesign_store::{FileDesignCorpus, ProfileCatalog};
use std::sync::Arc;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config = load_config_with_overrides(&cli)?;

    match cli.command {
        Commands::Analyze(args) => analyze::execute(args, &config, &output).await,
        Commands::Optimize(args) => optimize::execute(args, &config, &output).await,
        Commands::History(args) => history::execute(args, &config, &output).await,
        Commands::Chat(args) => chat::execute(args, &config, &output).await,
        Commands::Config => config::execute(&config, &output),
    }
}

/// Engines and the corpus wired from the effective configuration
pub(crate) struct Services {
    pub corpus: Arc<FileDesignCorpus>,
    pub analysis: Arc<AnalysisEngine>,
    pub optimizer: Arc<OptimizationEngine>,
    pub comparison: ComparisonEngine,
}

impl Services {
    pub fn from_config(config: &LayeredConfig, output: &OutputWriter) -> Self {
        let availability = JsonModelLoader::new(config.model_path.value.clone()).load();
        let analysis = Arc::new(AnalysisEngine::from_availability(&availability));

        let profiles = match ProfileCatalog::load(&config.profiles_path.value) {
            Ok(catalog) => ProfileAdvisor::new(catalog.profiles().to_vec()),
            Err(e) => {
                output.warning(format!("Steel profiles unavailable: {}", e));
                ProfileAdvisor::new(Vec::new())
            }
        };

        let optimizer = Arc::new(
            OptimizationEngine::new(Arc::clone(&analysis), config.optimizer_settings())
                .with_profiles(profiles),
        );

        Self {
            corpus: Arc::new(FileDesignCorpus::new(config.corpus_path.value.clone())),
            analysis,
            optimizer,
            comparison: ComparisonEngine::new(config.length_tolerance_pct.value),
        }
    }
}

pub(crate) fn parse_material(raw: &str) -> Result<Material> {
    raw.parse::<Material>()
        .with_context(|| format!("Invalid --material '{}'", raw))
}

impl DesignArgs {
    pub fn to_design(&self) -> Result<BeamDesign> {
        let load_type = match self.load_type {
            LoadTypeArg::Point => LoadType::Point,
            LoadTypeArg::Distributed => LoadType::Distributed,
        };
        BeamDesign::new(
            parse_material(&self.material)?,
            self.length,
            self.load,
            load_type,
            self.width,
            self.height,
        )
        .context("Invalid beam")
    }
}
