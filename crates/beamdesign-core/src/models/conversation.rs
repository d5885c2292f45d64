use serde::{Deserialize, Serialize};
use std::fmt;

use super::analysis::AnalysisResult;
use super::beam::{BeamSpecification, SpecField};
use super::history::ComparisonOutcome;
use super::optimization::OptimizationReport;
use crate::error::{BeamdesignError, Result};

/// Opaque session identifier supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Conversation phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    GatheringInfo,
    Analyzing,
    HistoryResults,
    Optimizing,
    Completed,
}

/// Permitted forward transitions. Reset to `GatheringInfo` is allowed from
/// every phase and is not listed.
const TRANSITIONS: [(Phase, Phase); 6] = [
    (Phase::GatheringInfo, Phase::Analyzing),
    (Phase::Analyzing, Phase::HistoryResults),
    (Phase::HistoryResults, Phase::Optimizing),
    (Phase::HistoryResults, Phase::Completed),
    (Phase::Optimizing, Phase::Completed),
    (Phase::Completed, Phase::GatheringInfo),
];

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::GatheringInfo => "GATHERING_INFO",
            Phase::Analyzing => "ANALYZING",
            Phase::HistoryResults => "HISTORY_RESULTS",
            Phase::Optimizing => "OPTIMIZING",
            Phase::Completed => "COMPLETED",
        }
    }

    pub fn can_transition_to(self, next: Phase) -> bool {
        next == Phase::GatheringInfo || TRANSITIONS.contains(&(self, next))
    }

    /// Explicit actions accepted in this phase
    pub fn allowed_actions(self) -> &'static [TurnAction] {
        match self {
            Phase::GatheringInfo => &[TurnAction::ProvideFields, TurnAction::Reset],
            Phase::Analyzing => &[TurnAction::ShowHistory, TurnAction::Decline, TurnAction::Reset],
            Phase::HistoryResults => &[TurnAction::Optimize, TurnAction::Decline, TurnAction::Reset],
            Phase::Optimizing => &[TurnAction::Reset],
            Phase::Completed => &[TurnAction::NewDesign, TurnAction::Reset],
        }
    }

    pub fn permits(self, action: TurnAction) -> bool {
        self.allowed_actions().contains(&action)
    }

    /// Phases where the user answers a yes/no offer
    pub fn awaits_confirmation(self) -> bool {
        matches!(self, Phase::Analyzing | Phase::HistoryResults)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit action attached to a turn, bypassing intent classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnAction {
    ProvideFields,
    ShowHistory,
    Optimize,
    Decline,
    NewDesign,
    Reset,
}

impl fmt::Display for TurnAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TurnAction::ProvideFields => "provide fields",
            TurnAction::ShowHistory => "show history",
            TurnAction::Optimize => "optimize",
            TurnAction::Decline => "decline",
            TurnAction::NewDesign => "start a new design",
            TurnAction::Reset => "reset",
        };
        f.write_str(name)
    }
}

/// Classified intent of a free-text turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Affirm,
    Deny,
    Reset,
    NewDesign,
    Unrelated,
}

/// Language used for a session's messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    De,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::En => f.write_str("en"),
            Language::De => f.write_str("de"),
        }
    }
}

/// Per-session conversation state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub session_id: SessionId,
    pub phase: Phase,
    pub specification: BeamSpecification,

    /// Required fields still absent, in prompting order
    pub missing_fields: Vec<SpecField>,

    pub last_analysis: Option<AnalysisResult>,
    pub last_comparison: Option<ComparisonOutcome>,
    pub last_optimization: Option<OptimizationReport>,
    pub language: Language,
}

impl ConversationState {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            phase: Phase::GatheringInfo,
            specification: BeamSpecification::new(),
            missing_fields: SpecField::REQUIRED.to_vec(),
            last_analysis: None,
            last_comparison: None,
            last_optimization: None,
            language: Language::default(),
        }
    }

    /// Back to an empty `GatheringInfo` state, keeping the id and language
    pub fn reset(&mut self) {
        let language = self.language;
        *self = Self::new(self.session_id.clone());
        self.language = language;
    }

    pub fn transition_to(&mut self, next: Phase) -> Result<()> {
        if !self.phase.can_transition_to(next) {
            return Err(BeamdesignError::StateViolation {
                phase: self.phase,
                requested: format!("move to {}", next),
            });
        }
        tracing::debug!(session_id = %self.session_id, from = %self.phase, to = %next, "Phase transition");
        self.phase = next;
        Ok(())
    }

    pub fn refresh_missing(&mut self) {
        self.missing_fields = self.specification.missing_fields();
    }
}
