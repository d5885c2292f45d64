pub mod analysis;
pub mod beam;
pub mod conversation;
pub mod features;
pub mod history;
pub mod optimization;
pub mod profile;

pub use analysis::{AnalysisResult, AnalysisSource, DesignStatus};
pub use beam::{
    BeamDesign, BeamSpecification, ExtractedFields, FieldIssue, LoadType, Material, SpecField,
    MIN_SECTION_MM, SERVICEABILITY_RATIO,
};
pub use conversation::{ConversationState, Intent, Language, Phase, SessionId, TurnAction};
pub use features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use history::{Comparison, ComparisonOutcome, Efficiency, HistoricalDesign, Provenance};
pub use optimization::{
    Baseline, BaselineKind, OptimizationCategory, OptimizationFailure, OptimizationReport,
    OptimizationResult, StrategyKind, StrategyReport,
};
pub use profile::{ProfileRecommendation, SteelProfile};
