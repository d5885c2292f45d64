//! Phase orchestrator
//!
//! Drives each session through
//! `GATHERING_INFO → ANALYZING → HISTORY_RESULTS → OPTIMIZING → COMPLETED`.
//! A turn either carries an explicit [`TurnAction`], checked against the
//! phase's allowed actions, or free text that is classified into an
//! [`Intent`]. Every turn produces a [`TurnResponse`]; failures become
//! structured messages for that session only.

use beamdesign_core::config::{DEFAULT_SESSION_IDLE_TIMEOUT_SECS, DEFAULT_TURN_TIMEOUT_SECS};
use beamdesign_core::error::{BeamdesignError, Result};
use beamdesign_core::models::{
    AnalysisResult, BeamSpecification, ComparisonOutcome, ConversationState, ExtractedFields,
    HistoricalDesign, Intent, OptimizationFailure, OptimizationReport, OptimizationResult, Phase,
    SessionId, SpecField, TurnAction,
};
use beamdesign_core::ports::{FieldExtractor, IntentClassifier};
use beamdesign_engine::{AnalysisEngine, ComparisonEngine, OptimizationEngine};
use beamdesign_store::DesignCorpus;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::extract::LocalFieldExtractor;
use crate::intent::KeywordIntentClassifier;
use crate::language;
use crate::messages::{MessageKind, MessagePayload};
use crate::session::{SessionSlot, SessionStore};

/// One inbound turn
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnInput {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub uploaded_fields: Option<serde_json::Value>,
    #[serde(default)]
    pub action: Option<TurnAction>,
}

impl TurnInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn action(action: TurnAction) -> Self {
        Self {
            action: Some(action),
            ..Self::default()
        }
    }

    pub fn with_upload(mut self, uploaded: serde_json::Value) -> Self {
        self.uploaded_fields = Some(uploaded);
        self
    }
}

/// A collaborator problem the turn worked around
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum DegradedSignal {
    /// Comparison unavailable; optimization used the last rows read
    CorpusUnavailable { reason: String },
    /// The optimized design was shown but not recorded
    AppendFailed { reason: String },
    OptimizationTimedOut { after_secs: f64 },
}

/// Structured result of one turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResponse {
    pub session_id: SessionId,
    pub phase: Phase,
    pub message: MessagePayload,
    pub specification: BeamSpecification,
    pub missing_fields: Vec<SpecField>,
    pub analysis: Option<AnalysisResult>,
    pub comparison: Option<ComparisonOutcome>,
    pub optimization: Option<OptimizationReport>,
    pub next_actions: Vec<TurnAction>,
    pub degraded: Vec<DegradedSignal>,
}

impl TurnResponse {
    fn from_state(state: &ConversationState, kind: MessageKind, degraded: Vec<DegradedSignal>) -> Self {
        Self {
            session_id: state.session_id.clone(),
            phase: state.phase,
            message: MessagePayload::render(kind, state),
            specification: state.specification.clone(),
            missing_fields: state.missing_fields.clone(),
            analysis: state.last_analysis,
            comparison: state.last_comparison.clone(),
            optimization: state.last_optimization.clone(),
            next_actions: state.phase.allowed_actions().to_vec(),
            degraded,
        }
    }
}

struct CorpusSnapshot {
    rows: Vec<HistoricalDesign>,
    error: Option<String>,
}

pub struct PhaseOrchestrator {
    sessions: SessionStore,
    corpus: Arc<dyn DesignCorpus>,
    /// Last rows read successfully, used while the corpus is unreadable
    last_good_rows: RwLock<Vec<HistoricalDesign>>,
    analysis: Arc<AnalysisEngine>,
    comparison: ComparisonEngine,
    optimizer: Arc<OptimizationEngine>,
    extractor: Arc<dyn FieldExtractor>,
    classifier: Arc<dyn IntentClassifier>,
    turn_timeout: Duration,
}

impl PhaseOrchestrator {
    pub fn new(
        corpus: Arc<dyn DesignCorpus>,
        optimizer: Arc<OptimizationEngine>,
        extractor: Arc<dyn FieldExtractor>,
        classifier: Arc<dyn IntentClassifier>,
    ) -> Self {
        Self {
            sessions: SessionStore::new(Duration::from_secs(DEFAULT_SESSION_IDLE_TIMEOUT_SECS)),
            corpus,
            last_good_rows: RwLock::new(Vec::new()),
            analysis: Arc::clone(optimizer.analysis()),
            comparison: ComparisonEngine::new(optimizer.settings().length_tolerance_pct),
            optimizer,
            extractor,
            classifier,
            turn_timeout: Duration::from_secs(DEFAULT_TURN_TIMEOUT_SECS),
        }
    }

    /// Orchestrator using the local extractor and keyword classifier
    pub fn local(corpus: Arc<dyn DesignCorpus>, optimizer: Arc<OptimizationEngine>) -> Self {
        Self::new(
            corpus,
            optimizer,
            Arc::new(LocalFieldExtractor::new()),
            Arc::new(KeywordIntentClassifier::new()),
        )
    }

    pub fn with_turn_timeout(mut self, turn_timeout: Duration) -> Self {
        self.turn_timeout = turn_timeout;
        self
    }

    /// Replaces the (still empty) session store
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.sessions = SessionStore::new(idle_timeout);
        self
    }

    pub fn with_comparison(mut self, comparison: ComparisonEngine) -> Self {
        self.comparison = comparison;
        self
    }

    /// Handle one turn. Turns of the same session run one at a time, in
    /// arrival order.
    pub async fn handle_turn(&self, session_id: &SessionId, input: TurnInput) -> TurnResponse {
        let slot = self.sessions.get_or_create(session_id);
        if self.cancels_running_turn(&slot, &input).await {
            // invalidate an optimization still running for this session
            slot.bump_generation();
        }

        let mut state = slot.lock().await;
        slot.touch();
        if let Some(language) = language::detect(&input.text) {
            state.language = language;
        }

        let before = state.clone();
        let mut degraded = Vec::new();
        let outcome = match input.action {
            Some(action) => {
                self.dispatch_action(&slot, &mut state, action, &input, &mut degraded)
                    .await
            }
            None => self.dispatch_text(&slot, &mut state, &input, &mut degraded).await,
        };

        let kind = match outcome {
            Ok(kind) => kind,
            Err(BeamdesignError::StateViolation { phase, requested }) => {
                tracing::debug!(session_id = %session_id, phase = %phase, requested = %requested, "Rejected out-of-order request");
                *state = before;
                MessageKind::Guidance { requested, phase }
            }
            Err(err @ BeamdesignError::Validation { .. }) => {
                state.refresh_missing();
                MessageKind::InvalidField {
                    issues: vec![err.into()],
                    next_field: state.missing_fields.first().copied(),
                }
            }
            Err(err) => {
                tracing::warn!(session_id = %session_id, phase = %before.phase, "Turn failed: {}", err);
                *state = before;
                MessageKind::Unavailable {
                    reason: err.to_string(),
                }
            }
        };

        slot.touch();
        tracing::info!(session_id = %session_id, phase = %state.phase, "Turn handled");
        TurnResponse::from_state(&state, kind, degraded)
    }

    /// Whether the turn is a reset that must reach a turn already in
    /// flight. Text is classified ahead of the queue only while the session
    /// is busy, against the phase a running optimization holds.
    async fn cancels_running_turn(&self, slot: &SessionSlot, input: &TurnInput) -> bool {
        match input.action {
            Some(action) => action == TurnAction::Reset,
            None if slot.is_busy() => matches!(
                self.classifier.classify(&input.text, Phase::Optimizing).await,
                Ok(Intent::Reset)
            ),
            None => false,
        }
    }

    async fn dispatch_action(
        &self,
        slot: &SessionSlot,
        state: &mut ConversationState,
        action: TurnAction,
        input: &TurnInput,
        degraded: &mut Vec<DegradedSignal>,
    ) -> Result<MessageKind> {
        if !state.phase.permits(action) {
            return Err(BeamdesignError::StateViolation {
                phase: state.phase,
                requested: action.to_string(),
            });
        }

        match action {
            TurnAction::ProvideFields => self.gather(state, input).await,
            TurnAction::ShowHistory => self.show_history(state, degraded).await,
            TurnAction::Optimize => self.optimize(slot, state, degraded).await,
            TurnAction::Decline => self.decline(state),
            TurnAction::NewDesign => self.start_new_design(slot, state, input).await,
            TurnAction::Reset => Ok(Self::reset(slot, state)),
        }
    }

    async fn dispatch_text(
        &self,
        slot: &SessionSlot,
        state: &mut ConversationState,
        input: &TurnInput,
        degraded: &mut Vec<DegradedSignal>,
    ) -> Result<MessageKind> {
        let intent = match self.classifier.classify(&input.text, state.phase).await {
            Ok(intent) => intent,
            Err(e) => {
                tracing::warn!(session_id = %state.session_id, "Intent classification failed: {}", e);
                Intent::Unrelated
            }
        };

        match (state.phase, intent) {
            (_, Intent::Reset) => Ok(Self::reset(slot, state)),
            (Phase::GatheringInfo, _) => self.gather(state, input).await,
            (Phase::Completed, Intent::NewDesign) => {
                self.start_new_design(slot, state, input).await
            }
            (phase, Intent::NewDesign) => Err(BeamdesignError::StateViolation {
                phase,
                requested: TurnAction::NewDesign.to_string(),
            }),
            (Phase::Analyzing, Intent::Affirm) => self.show_history(state, degraded).await,
            (Phase::Analyzing, _) => Ok(MessageKind::OfferHistory),
            (Phase::HistoryResults, Intent::Affirm) => self.optimize(slot, state, degraded).await,
            (Phase::HistoryResults, _) => self.decline(state),
            (Phase::Optimizing | Phase::Completed, _) => Ok(MessageKind::Completed),
        }
    }

    async fn extract(&self, input: &TurnInput) -> Result<ExtractedFields> {
        self.extractor
            .extract(&input.text, input.uploaded_fields.as_ref())
            .await
    }

    async fn gather(&self, state: &mut ConversationState, input: &TurnInput) -> Result<MessageKind> {
        let fields = self.extract(input).await?;
        self.gather_fields(state, &fields)
    }

    /// Merge fields; analyze and move to `ANALYZING` once complete. Rejected
    /// values only hold up analysis while a required field is missing.
    fn gather_fields(
        &self,
        state: &mut ConversationState,
        fields: &ExtractedFields,
    ) -> Result<MessageKind> {
        let issues = state.specification.merge(fields);
        state.refresh_missing();
        if !issues.is_empty() {
            tracing::debug!(session_id = %state.session_id, rejected = issues.len(), "Rejected field values");
        }

        if let Some(&next) = state.missing_fields.first() {
            if issues.is_empty() {
                return Ok(MessageKind::AskField { field: next });
            }
            return Ok(MessageKind::InvalidField {
                issues,
                next_field: Some(next),
            });
        }

        let design = state.specification.to_design()?;
        let analysis = self.analysis.analyze(&design)?;
        tracing::info!(
            session_id = %state.session_id,
            deflection_mm = analysis.deflection_mm,
            status = %analysis.status,
            source = %analysis.source,
            "Analysis complete"
        );
        state.transition_to(Phase::Analyzing)?;
        state.last_analysis = Some(analysis);
        Ok(MessageKind::AnalysisReady { issues })
    }

    async fn show_history(
        &self,
        state: &mut ConversationState,
        degraded: &mut Vec<DegradedSignal>,
    ) -> Result<MessageKind> {
        let design = state.specification.to_design()?;
        let analysis = match state.last_analysis {
            Some(analysis) => analysis,
            None => self.analysis.analyze(&design)?,
        };
        state.transition_to(Phase::HistoryResults)?;
        state.last_analysis = Some(analysis);

        let snapshot = self.corpus_snapshot().await;
        if let Some(reason) = snapshot.error {
            degraded.push(DegradedSignal::CorpusUnavailable {
                reason: reason.clone(),
            });
            state.last_comparison = Some(ComparisonOutcome::Unavailable {
                reason: reason.clone(),
            });
            return Ok(MessageKind::HistoryUnavailable { reason });
        }

        match self.comparison.compare(&design, &analysis, &snapshot.rows) {
            Some(comparison) => {
                state.last_comparison = Some(ComparisonOutcome::Found(comparison));
                Ok(MessageKind::HistoryFound)
            }
            None => {
                state.last_comparison = Some(ComparisonOutcome::NoAlternative);
                state.transition_to(Phase::Completed)?;
                Ok(MessageKind::NoAlternativeFound)
            }
        }
    }

    async fn optimize(
        &self,
        slot: &SessionSlot,
        state: &mut ConversationState,
        degraded: &mut Vec<DegradedSignal>,
    ) -> Result<MessageKind> {
        let before = state.clone();
        let design = state.specification.to_design()?;
        state.transition_to(Phase::Optimizing)?;

        let snapshot = self.corpus_snapshot().await;
        if let Some(reason) = snapshot.error {
            degraded.push(DegradedSignal::CorpusUnavailable { reason });
        }

        let generation = slot.generation();
        let optimizer = Arc::clone(&self.optimizer);
        let rows = snapshot.rows;
        let task = tokio::task::spawn_blocking(move || optimizer.optimize(&design, &rows));
        let outcome = tokio::time::timeout(self.turn_timeout, task).await;

        if slot.generation() != generation {
            tracing::info!(session_id = %state.session_id, "Session reset during optimization, discarding result");
            *state = before;
            return Ok(MessageKind::OptimizationDiscarded);
        }

        let report = match outcome {
            Ok(Ok(Ok(result))) => {
                self.persist(&state.session_id, &result, degraded).await;
                OptimizationReport::Optimized(Box::new(result))
            }
            Ok(Ok(Err(BeamdesignError::OptimizationInfeasible(failure)))) => {
                tracing::info!(session_id = %state.session_id, "Optimization infeasible: {}", failure);
                OptimizationReport::Failed(*failure)
            }
            Ok(Ok(Err(other))) => OptimizationReport::Failed(failure(other.to_string())),
            Ok(Err(join_error)) => {
                tracing::error!(session_id = %state.session_id, "Optimization task failed: {}", join_error);
                OptimizationReport::Failed(failure(format!("optimization task failed: {}", join_error)))
            }
            Err(_) => {
                let after_secs = self.turn_timeout.as_secs_f64();
                tracing::warn!(session_id = %state.session_id, after_secs, "Optimization timed out");
                degraded.push(DegradedSignal::OptimizationTimedOut { after_secs });
                OptimizationReport::Failed(failure(format!(
                    "optimization timed out after {:.1} s",
                    after_secs
                )))
            }
        };

        let kind = if report.is_success() {
            MessageKind::OptimizationSucceeded
        } else {
            MessageKind::OptimizationFailed
        };
        state.last_optimization = Some(report);
        state.transition_to(Phase::Completed)?;
        Ok(kind)
    }

    async fn persist(
        &self,
        session_id: &SessionId,
        result: &OptimizationResult,
        degraded: &mut Vec<DegradedSignal>,
    ) {
        let row = HistoricalDesign::optimized(&result.specification, result.deflection_mm, Utc::now());
        match self.corpus.append(&row).await {
            Ok(()) => {
                tracing::info!(session_id = %session_id, corpus = %self.corpus.describe(), "Recorded optimized design");
                self.last_good_rows.write().await.push(row);
            }
            Err(e) => {
                tracing::warn!(session_id = %session_id, "Failed to record optimized design: {}", e);
                degraded.push(DegradedSignal::AppendFailed {
                    reason: e.to_string(),
                });
            }
        }
    }

    fn decline(&self, state: &mut ConversationState) -> Result<MessageKind> {
        match state.phase {
            Phase::Analyzing => Ok(MessageKind::OfferHistory),
            _ => {
                state.transition_to(Phase::Completed)?;
                Ok(MessageKind::Completed)
            }
        }
    }

    fn reset(slot: &SessionSlot, state: &mut ConversationState) -> MessageKind {
        slot.bump_generation();
        state.reset();
        tracing::debug!(session_id = %state.session_id, "Session reset");
        MessageKind::SessionReset
    }

    /// Reset, then take any fields the same turn carries
    async fn start_new_design(
        &self,
        slot: &SessionSlot,
        state: &mut ConversationState,
        input: &TurnInput,
    ) -> Result<MessageKind> {
        let fields = self.extract(input).await?;
        let kind = Self::reset(slot, state);
        if fields.is_empty() {
            return Ok(kind);
        }
        self.gather_fields(state, &fields)
    }

    async fn corpus_snapshot(&self) -> CorpusSnapshot {
        match self.corpus.load().await {
            Ok(rows) => {
                *self.last_good_rows.write().await = rows.clone();
                CorpusSnapshot { rows, error: None }
            }
            Err(e) => {
                tracing::warn!(corpus = %self.corpus.describe(), "Corpus unavailable, using last rows read: {}", e);
                CorpusSnapshot {
                    rows: self.last_good_rows.read().await.clone(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    pub async fn session_snapshot(&self, session_id: &SessionId) -> Option<ConversationState> {
        let slot = self.sessions.get(session_id)?;
        let state = slot.lock().await;
        Some(state.clone())
    }

    /// Forget a session entirely
    pub fn clear_session(&self, session_id: &SessionId) -> bool {
        match self.sessions.remove(session_id) {
            Some(slot) => {
                slot.bump_generation();
                true
            }
            None => false,
        }
    }

    /// Reset a session from outside a turn. A running optimization for the
    /// session has its result discarded.
    pub async fn reset_session(&self, session_id: &SessionId) -> Option<ConversationState> {
        let slot = self.sessions.get(session_id)?;
        slot.bump_generation();
        let mut state = slot.lock().await;
        state.reset();
        slot.touch();
        Some(state.clone())
    }

    pub fn evict_idle(&self) -> usize {
        self.sessions.evict_idle()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Periodic idle eviction, stopping once the orchestrator is dropped
    pub fn spawn_eviction_task(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let orchestrator = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let Some(orchestrator) = orchestrator.upgrade() else {
                    break;
                };
                let evicted = orchestrator.evict_idle();
                if evicted > 0 {
                    tracing::debug!(evicted, "Evicted idle sessions");
                }
            }
        })
    }
}

fn failure(reason: String) -> OptimizationFailure {
    OptimizationFailure {
        reason,
        best_candidate: None,
        constraint_gap_mm: None,
        attempts: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beamdesign_core::config::OptimizerSettings;
    use beamdesign_store::MemoryDesignCorpus;

    fn orchestrator() -> PhaseOrchestrator {
        let optimizer = OptimizationEngine::new(
            Arc::new(AnalysisEngine::physics_only()),
            OptimizerSettings::default(),
        );
        PhaseOrchestrator::local(Arc::new(MemoryDesignCorpus::new()), Arc::new(optimizer))
    }

    #[tokio::test]
    async fn test_first_turn_asks_for_material() {
        let orchestrator = orchestrator();
        let response = orchestrator
            .handle_turn(&SessionId::from("s1"), TurnInput::text("hello"))
            .await;

        assert_eq!(response.phase, Phase::GatheringInfo);
        assert_eq!(response.missing_fields.len(), 5);
        assert_eq!(
            response.message.kind,
            MessageKind::AskField {
                field: SpecField::Material
            }
        );
        assert_eq!(orchestrator.session_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_value_is_reprompted() {
        let orchestrator = orchestrator();
        let response = orchestrator
            .handle_turn(
                &SessionId::from("s1"),
                TurnInput::text("material=steel length=-6000"),
            )
            .await;

        assert_eq!(response.phase, Phase::GatheringInfo);
        assert_eq!(response.specification.length_mm, None);
        match response.message.kind {
            MessageKind::InvalidField { issues, next_field } => {
                assert_eq!(issues[0].field, "length_mm");
                assert_eq!(next_field, Some(SpecField::Length));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_clear_session_forgets_state() {
        let orchestrator = orchestrator();
        let id = SessionId::from("s1");
        orchestrator.handle_turn(&id, TurnInput::text("material=wood")).await;

        assert!(orchestrator.clear_session(&id));
        assert!(orchestrator.session_snapshot(&id).await.is_none());
        assert!(!orchestrator.clear_session(&id));
    }
}
