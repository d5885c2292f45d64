use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Beamdesign - Beam deflection analysis and section optimization
#[derive(Parser, Debug)]
#[command(name = "beamdesign")]
#[command(about = "Beam deflection analysis, section optimization and design history", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./beamdesign.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Historical design corpus file
    #[arg(long, global = true, value_name = "FILE")]
    pub corpus: Option<PathBuf>,

    /// Steel profile table
    #[arg(long, global = true, value_name = "FILE")]
    pub profiles: Option<PathBuf>,

    /// Deflection model artifact (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    pub model: Option<PathBuf>,

    /// Length tolerance for historical matches, in percent
    #[arg(long, global = true, value_name = "PCT")]
    pub tolerance: Option<f64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze the deflection of a beam
    Analyze(AnalyzeArgs),

    /// Find the smallest passing cross-section for a beam
    Optimize(OptimizeArgs),

    /// List historical designs, optionally filtered by material and length
    History(HistoryArgs),

    /// Start an interactive design conversation
    Chat(ChatArgs),

    /// Show the effective configuration and where each value came from
    Config,
}

/// Load application
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LoadTypeArg {
    /// Single load at midspan
    Point,
    /// Load spread uniformly over the span
    Distributed,
}

/// A complete beam, as command-line flags
#[derive(Args, Debug, Clone)]
pub struct DesignArgs {
    /// Material (steel, wood, concrete)
    #[arg(long)]
    pub material: String,

    /// Span in mm
    #[arg(long)]
    pub length: f64,

    /// Total load in N
    #[arg(long)]
    pub load: f64,

    /// Cross-section width in mm
    #[arg(long)]
    pub width: f64,

    /// Cross-section height in mm
    #[arg(long)]
    pub height: f64,

    #[arg(long, value_enum, default_value = "point")]
    pub load_type: LoadTypeArg,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub design: DesignArgs,

    /// Also look up the best historical alternative
    #[arg(long)]
    pub compare: bool,
}

#[derive(Args, Debug)]
pub struct OptimizeArgs {
    #[command(flatten)]
    pub design: DesignArgs,

    /// Append the optimized design to the corpus
    #[arg(long)]
    pub persist: bool,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Only rows of this material
    #[arg(long)]
    pub material: Option<String>,

    /// Only rows whose span is within the tolerance of this length (mm)
    #[arg(long)]
    pub length: Option<f64>,

    /// Only passing rows
    #[arg(long)]
    pub passing: bool,
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Session identifier (a fresh one is generated when omitted)
    #[arg(long)]
    pub session: Option<String>,
}
