use crate::error::{BeamdesignError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has at least the same precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() >= self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Budgets and tolerances handed to the optimization engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizerSettings {
    /// Iteration cap per strategy attempt
    pub max_iterations: usize,
    /// Wall-clock budget per strategy attempt
    pub time_budget: Duration,
    pub multistart_samples: usize,
    pub search_seed: u64,
    pub length_tolerance_pct: f64,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            time_budget: Duration::from_millis(DEFAULT_STRATEGY_BUDGET_MS),
            multistart_samples: DEFAULT_MULTISTART_SAMPLES,
            search_seed: DEFAULT_SEARCH_SEED,
            length_tolerance_pct: DEFAULT_LENGTH_TOLERANCE_PCT,
        }
    }
}

pub const DEFAULT_LENGTH_TOLERANCE_PCT: f64 = 5.0;
pub const DEFAULT_MAX_ITERATIONS: usize = 400;
pub const DEFAULT_STRATEGY_BUDGET_MS: u64 = 2_000;
pub const DEFAULT_MULTISTART_SAMPLES: usize = 256;
pub const DEFAULT_SEARCH_SEED: u64 = 42;
pub const DEFAULT_TURN_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SESSION_IDLE_TIMEOUT_SECS: u64 = 1_800;

/// Layered configuration for the beam design assistant
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub corpus_path: ConfigValue<PathBuf>,
    pub profiles_path: ConfigValue<PathBuf>,
    pub model_path: ConfigValue<Option<PathBuf>>,
    pub length_tolerance_pct: ConfigValue<f64>,
    pub max_iterations: ConfigValue<usize>,
    pub strategy_time_budget_ms: ConfigValue<u64>,
    pub multistart_samples: ConfigValue<usize>,
    pub search_seed: ConfigValue<u64>,
    pub turn_timeout_secs: ConfigValue<u64>,
    pub session_idle_timeout_secs: ConfigValue<u64>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        let default = ConfigSource::Default;
        Self {
            corpus_path: ConfigValue::new(PathBuf::from("data/historical_designs.csv"), default),
            profiles_path: ConfigValue::new(PathBuf::from("data/steel_profiles.csv"), default),
            model_path: ConfigValue::new(None, default),
            length_tolerance_pct: ConfigValue::new(DEFAULT_LENGTH_TOLERANCE_PCT, default),
            max_iterations: ConfigValue::new(DEFAULT_MAX_ITERATIONS, default),
            strategy_time_budget_ms: ConfigValue::new(DEFAULT_STRATEGY_BUDGET_MS, default),
            multistart_samples: ConfigValue::new(DEFAULT_MULTISTART_SAMPLES, default),
            search_seed: ConfigValue::new(DEFAULT_SEARCH_SEED, default),
            turn_timeout_secs: ConfigValue::new(DEFAULT_TURN_TIMEOUT_SECS, default),
            session_idle_timeout_secs: ConfigValue::new(DEFAULT_SESSION_IDLE_TIMEOUT_SECS, default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| BeamdesignError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| BeamdesignError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        let file = ConfigSource::File;

        if let Some(path) = file_config.corpus_path {
            self.corpus_path.update(path, file);
        }
        if let Some(path) = file_config.profiles_path {
            self.profiles_path.update(path, file);
        }
        if let Some(path) = file_config.model_path {
            self.model_path.update(Some(path), file);
        }
        if let Some(tolerance) = file_config.length_tolerance_pct {
            self.length_tolerance_pct.update(validate_tolerance(tolerance)?, file);
        }
        if let Some(n) = file_config.max_iterations {
            self.max_iterations.update(non_zero("max_iterations", n)?, file);
        }
        if let Some(ms) = file_config.strategy_time_budget_ms {
            self.strategy_time_budget_ms.update(non_zero("strategy_time_budget_ms", ms)?, file);
        }
        if let Some(n) = file_config.multistart_samples {
            self.multistart_samples.update(non_zero("multistart_samples", n)?, file);
        }
        if let Some(seed) = file_config.search_seed {
            self.search_seed.update(seed, file);
        }
        if let Some(secs) = file_config.turn_timeout_secs {
            self.turn_timeout_secs.update(non_zero("turn_timeout_secs", secs)?, file);
        }
        if let Some(secs) = file_config.session_idle_timeout_secs {
            self.session_idle_timeout_secs
                .update(non_zero("session_idle_timeout_secs", secs)?, file);
        }

        Ok(self)
    }

    /// Load configuration from `BEAMDESIGN_*` environment variables.
    ///
    /// Invalid values are logged and ignored.
    pub fn load_from_env(mut self) -> Self {
        let envs = ConfigSource::Environment;

        if let Ok(path) = env::var("BEAMDESIGN_CORPUS_PATH") {
            self.corpus_path.update(PathBuf::from(path), envs);
        }
        if let Ok(path) = env::var("BEAMDESIGN_PROFILES_PATH") {
            self.profiles_path.update(PathBuf::from(path), envs);
        }
        if let Ok(path) = env::var("BEAMDESIGN_MODEL_PATH") {
            self.model_path.update(Some(PathBuf::from(path)), envs);
        }
        if let Some(tolerance) =
            env_value("BEAMDESIGN_LENGTH_TOLERANCE_PCT", validate_tolerance)
        {
            self.length_tolerance_pct.update(tolerance, envs);
        }
        if let Some(n) = env_value("BEAMDESIGN_MAX_ITERATIONS", |n| non_zero("max_iterations", n)) {
            self.max_iterations.update(n, envs);
        }
        if let Some(ms) = env_value("BEAMDESIGN_STRATEGY_TIME_BUDGET_MS", |ms| {
            non_zero("strategy_time_budget_ms", ms)
        }) {
            self.strategy_time_budget_ms.update(ms, envs);
        }
        if let Some(n) = env_value("BEAMDESIGN_MULTISTART_SAMPLES", |n| {
            non_zero("multistart_samples", n)
        }) {
            self.multistart_samples.update(n, envs);
        }
        if let Some(seed) = env_value("BEAMDESIGN_SEARCH_SEED", Ok) {
            self.search_seed.update(seed, envs);
        }
        if let Some(secs) = env_value("BEAMDESIGN_TURN_TIMEOUT_SECS", |s| {
            non_zero("turn_timeout_secs", s)
        }) {
            self.turn_timeout_secs.update(secs, envs);
        }
        if let Some(secs) = env_value("BEAMDESIGN_SESSION_IDLE_TIMEOUT_SECS", |s| {
            non_zero("session_idle_timeout_secs", s)
        }) {
            self.session_idle_timeout_secs.update(secs, envs);
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        let cli = ConfigSource::Cli;

        if let Some(path) = overrides.corpus_path {
            self.corpus_path.update(path, cli);
        }
        if let Some(path) = overrides.profiles_path {
            self.profiles_path.update(path, cli);
        }
        if let Some(path) = overrides.model_path {
            self.model_path.update(Some(path), cli);
        }
        if let Some(tolerance) = overrides.length_tolerance_pct {
            match validate_tolerance(tolerance) {
                Ok(tolerance) => self.length_tolerance_pct.update(tolerance, cli),
                Err(e) => tracing::warn!("Ignoring --tolerance: {}", e),
            }
        }
    }

    pub fn optimizer_settings(&self) -> OptimizerSettings {
        OptimizerSettings {
            max_iterations: self.max_iterations.value,
            time_budget: Duration::from_millis(self.strategy_time_budget_ms.value),
            multistart_samples: self.multistart_samples.value,
            search_seed: self.search_seed.value,
            length_tolerance_pct: self.length_tolerance_pct.value,
        }
    }

    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs.value)
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_timeout_secs.value)
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "corpus_path".to_string(),
            (self.corpus_path.value.display().to_string(), self.corpus_path.source),
        );
        map.insert(
            "profiles_path".to_string(),
            (self.profiles_path.value.display().to_string(), self.profiles_path.source),
        );
        map.insert(
            "model_path".to_string(),
            (
                self.model_path
                    .value
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(none, physics only)".to_string()),
                self.model_path.source,
            ),
        );
        map.insert(
            "length_tolerance_pct".to_string(),
            (format!("{}%", self.length_tolerance_pct.value), self.length_tolerance_pct.source),
        );
        map.insert(
            "max_iterations".to_string(),
            (self.max_iterations.value.to_string(), self.max_iterations.source),
        );
        map.insert(
            "strategy_time_budget_ms".to_string(),
            (
                format!("{}ms", self.strategy_time_budget_ms.value),
                self.strategy_time_budget_ms.source,
            ),
        );
        map.insert(
            "multistart_samples".to_string(),
            (self.multistart_samples.value.to_string(), self.multistart_samples.source),
        );
        map.insert(
            "search_seed".to_string(),
            (self.search_seed.value.to_string(), self.search_seed.source),
        );
        map.insert(
            "turn_timeout_secs".to_string(),
            (format!("{}s", self.turn_timeout_secs.value), self.turn_timeout_secs.source),
        );
        map.insert(
            "session_idle_timeout_secs".to_string(),
            (
                format!("{}s", self.session_idle_timeout_secs.value),
                self.session_idle_timeout_secs.source,
            ),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    corpus_path: Option<PathBuf>,
    profiles_path: Option<PathBuf>,
    model_path: Option<PathBuf>,
    length_tolerance_pct: Option<f64>,
    max_iterations: Option<usize>,
    strategy_time_budget_ms: Option<u64>,
    multistart_samples: Option<usize>,
    search_seed: Option<u64>,
    turn_timeout_secs: Option<u64>,
    session_idle_timeout_secs: Option<u64>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub corpus_path: Option<PathBuf>,
    pub profiles_path: Option<PathBuf>,
    pub model_path: Option<PathBuf>,
    pub length_tolerance_pct: Option<f64>,
}

/// Tolerance must be a finite percentage in [0, 100]
pub fn validate_tolerance(tolerance: f64) -> Result<f64> {
    if tolerance.is_finite() && (0.0..=100.0).contains(&tolerance) {
        Ok(tolerance)
    } else {
        Err(BeamdesignError::ConfigInvalid {
            key: "length_tolerance_pct".to_string(),
            reason: format!("expected a percentage between 0 and 100, got {}", tolerance),
        })
    }
}

fn non_zero<T: PartialEq + Default + std::fmt::Display>(key: &str, value: T) -> Result<T> {
    if value == T::default() {
        return Err(BeamdesignError::ConfigInvalid {
            key: key.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

fn env_value<T, F>(var: &str, check: F) -> Option<T>
where
    T: FromStr,
    F: FnOnce(T) -> Result<T>,
{
    let raw = env::var(var).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => match check(value) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Invalid {} value '{}': {}", var, raw, e);
                None
            }
        },
        Err(_) => {
            tracing::warn!("Invalid {} value '{}': not a number", var, raw);
            None
        }
    }
}
