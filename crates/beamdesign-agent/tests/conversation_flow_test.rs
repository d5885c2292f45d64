//! Conversation flows through the phase orchestrator
//!
//! Uses the in-memory corpus, the local extractor and the keyword classifier.

use async_trait::async_trait;
use beamdesign_agent::{
    DegradedSignal, KeywordIntentClassifier, LocalFieldExtractor, MessageKind, PhaseOrchestrator,
    TurnInput,
};
use beamdesign_core::config::OptimizerSettings;
use beamdesign_core::error::Result;
use beamdesign_core::models::{
    BaselineKind, ComparisonOutcome, ConversationState, DesignStatus, ExtractedFields,
    HistoricalDesign, Language, Material, OptimizationReport, Phase, Provenance, SessionId,
    SpecField, StrategyKind, TurnAction,
};
use beamdesign_core::ports::FieldExtractor;
use beamdesign_engine::optimization::{
    Attempt, Bounds, Budget, GradientBarrier, OptimizationStrategy, Problem,
};
use beamdesign_engine::{AnalysisEngine, OptimizationEngine};
use beamdesign_store::{DesignCorpus, FileDesignCorpus, MemoryDesignCorpus};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const REFERENCE_BEAM: &str = "material=steel length=6000 load=20000 width=200 height=100";

fn optimizer() -> Arc<OptimizationEngine> {
    Arc::new(OptimizationEngine::new(
        Arc::new(AnalysisEngine::physics_only()),
        OptimizerSettings::default(),
    ))
}

fn steel_row() -> HistoricalDesign {
    HistoricalDesign {
        material: Material::Steel,
        length_mm: 6000.0,
        load_n: 20000.0,
        width_mm: 100.0,
        height_mm: 250.0,
        volume_mm3: 6000.0 * 100.0 * 250.0,
        deflection_mm: Some(3.46),
        status: DesignStatus::Pass,
        provenance: Provenance::Original,
        recorded_at: None,
    }
}

fn wood_row() -> HistoricalDesign {
    HistoricalDesign {
        material: Material::Wood,
        length_mm: 4000.0,
        load_n: 8000.0,
        width_mm: 120.0,
        height_mm: 240.0,
        volume_mm3: 4000.0 * 120.0 * 240.0,
        deflection_mm: None,
        status: DesignStatus::Pass,
        provenance: Provenance::Original,
        recorded_at: None,
    }
}

fn orchestrator(corpus: &Arc<MemoryDesignCorpus>) -> PhaseOrchestrator {
    let shared: Arc<dyn DesignCorpus> = corpus.clone();
    PhaseOrchestrator::local(shared, optimizer())
}

/// Gradient barrier that first sleeps on the blocking pool
struct SlowStrategy(Duration);

impl OptimizationStrategy for SlowStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::GradientBarrier
    }

    fn bounds(&self, problem: &Problem<'_>) -> Bounds {
        GradientBarrier::default().bounds(problem)
    }

    fn attempt(&self, problem: &Problem<'_>, bounds: &Bounds, budget: &Budget) -> Attempt {
        std::thread::sleep(self.0);
        GradientBarrier::default().attempt(problem, bounds, budget)
    }
}

fn slow_optimizer(delay: Duration) -> Arc<OptimizationEngine> {
    Arc::new(OptimizationEngine::with_strategies(
        Arc::new(AnalysisEngine::physics_only()),
        OptimizerSettings::default(),
        vec![Box::new(SlowStrategy(delay))],
    ))
}

/// Local extraction with a delay, to keep a turn in flight
struct SlowExtractor(Duration);

#[async_trait]
impl FieldExtractor for SlowExtractor {
    async fn extract(
        &self,
        text: &str,
        uploaded: Option<&serde_json::Value>,
    ) -> Result<ExtractedFields> {
        tokio::time::sleep(self.0).await;
        LocalFieldExtractor::new().extract(text, uploaded).await
    }
}

#[tokio::test]
async fn test_all_fields_in_one_turn_reach_analyzing() {
    let corpus = Arc::new(MemoryDesignCorpus::new());
    let orchestrator = orchestrator(&corpus);

    let response = orchestrator
        .handle_turn(&SessionId::from("a"), TurnInput::text(REFERENCE_BEAM))
        .await;

    assert_eq!(response.phase, Phase::Analyzing);
    assert!(response.missing_fields.is_empty());
    assert_eq!(response.message.kind, MessageKind::AnalysisReady { issues: Vec::new() });
    let analysis = response.analysis.unwrap();
    assert_eq!(analysis.status, DesignStatus::Fail);
    assert!((analysis.deflection_mm - 27.0).abs() < 1e-9);
    assert_eq!(
        response.next_actions,
        vec![TurnAction::ShowHistory, TurnAction::Decline, TurnAction::Reset]
    );
}

#[tokio::test]
async fn test_fields_gathered_over_several_turns() {
    let corpus = Arc::new(MemoryDesignCorpus::new());
    let orchestrator = orchestrator(&corpus);
    let id = SessionId::from("a");

    let first = orchestrator
        .handle_turn(&id, TurnInput::text("steel, length 6 m"))
        .await;
    assert_eq!(first.phase, Phase::GatheringInfo);
    assert_eq!(first.message.kind, MessageKind::AskField { field: SpecField::Load });

    let second = orchestrator
        .handle_turn(&id, TurnInput::text("").with_upload(json!({"Load": "20 kN", "Width": 200})))
        .await;
    assert_eq!(second.missing_fields, vec![SpecField::Height]);

    let third = orchestrator.handle_turn(&id, TurnInput::text("height=100")).await;
    assert_eq!(third.phase, Phase::Analyzing);
}

#[tokio::test]
async fn test_word_containing_reset_phrase_keeps_fields() {
    let corpus = Arc::new(MemoryDesignCorpus::new());
    let orchestrator = orchestrator(&corpus);
    let id = SessionId::from("nuclear");

    orchestrator
        .handle_turn(&id, TurnInput::text("material=steel length=6000 load=20000"))
        .await;
    let response = orchestrator
        .handle_turn(&id, TurnInput::text("width=200, it must be nuclear grade"))
        .await;

    assert_eq!(response.phase, Phase::GatheringInfo);
    assert_eq!(response.specification.material, Some(Material::Steel));
    assert_eq!(response.specification.length_mm, Some(6000.0));
    assert_eq!(response.specification.width_mm, Some(200.0));
    assert_eq!(response.missing_fields, vec![SpecField::Height]);
    assert_eq!(response.message.kind, MessageKind::AskField { field: SpecField::Height });
}

#[tokio::test]
async fn test_bad_load_type_does_not_hold_up_analysis() {
    let corpus = Arc::new(MemoryDesignCorpus::new());
    let orchestrator = orchestrator(&corpus);

    let response = orchestrator
        .handle_turn(
            &SessionId::from("lt"),
            TurnInput::text(format!("{} load_type=triangular", REFERENCE_BEAM)),
        )
        .await;

    assert_eq!(response.phase, Phase::Analyzing);
    assert!(response.analysis.is_some());
    match &response.message.kind {
        MessageKind::AnalysisReady { issues } => {
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].field, "load_type");
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(response.message.text.contains("load_type"));
}

#[tokio::test]
async fn test_bad_value_with_fields_missing_is_reprompted() {
    let corpus = Arc::new(MemoryDesignCorpus::new());
    let orchestrator = orchestrator(&corpus);

    let response = orchestrator
        .handle_turn(
            &SessionId::from("lt2"),
            TurnInput::text("material=steel length=6000 load_type=triangular"),
        )
        .await;

    assert_eq!(response.phase, Phase::GatheringInfo);
    match response.message.kind {
        MessageKind::InvalidField { issues, next_field } => {
            assert_eq!(issues[0].field, "load_type");
            assert_eq!(next_field, Some(SpecField::Load));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_new_design_before_completion_is_guided() {
    let corpus = Arc::new(MemoryDesignCorpus::new());
    let orchestrator = orchestrator(&corpus);
    let by_text = SessionId::from("text");
    let by_action = SessionId::from("action");

    orchestrator.handle_turn(&by_text, TurnInput::text(REFERENCE_BEAM)).await;
    orchestrator.handle_turn(&by_action, TurnInput::text(REFERENCE_BEAM)).await;

    let text = orchestrator
        .handle_turn(&by_text, TurnInput::text("new design please"))
        .await;
    let action = orchestrator
        .handle_turn(&by_action, TurnInput::action(TurnAction::NewDesign))
        .await;

    let expected = MessageKind::Guidance {
        requested: TurnAction::NewDesign.to_string(),
        phase: Phase::Analyzing,
    };
    assert_eq!(text.message.kind, expected);
    assert_eq!(action.message.kind, expected);
    assert_eq!(text.phase, Phase::Analyzing);
    assert_eq!(action.phase, Phase::Analyzing);
    assert_eq!(text.specification, action.specification);
    assert!(text.analysis.is_some());
}

#[tokio::test]
async fn test_no_alternative_completes_the_session() {
    let corpus = Arc::new(MemoryDesignCorpus::with_rows(vec![wood_row()]));
    let orchestrator = orchestrator(&corpus);
    let id = SessionId::from("c");

    orchestrator.handle_turn(&id, TurnInput::text(REFERENCE_BEAM)).await;
    let response = orchestrator.handle_turn(&id, TurnInput::text("yes")).await;

    assert_eq!(response.phase, Phase::Completed);
    assert_eq!(response.comparison, Some(ComparisonOutcome::NoAlternative));
    assert_eq!(response.message.kind, MessageKind::NoAlternativeFound);
    assert_eq!(
        response.next_actions,
        vec![TurnAction::NewDesign, TurnAction::Reset]
    );
}

#[tokio::test]
async fn test_out_of_order_action_leaves_state_untouched() {
    let corpus = Arc::new(MemoryDesignCorpus::new());
    let orchestrator = orchestrator(&corpus);
    let id = SessionId::from("d");

    let before = orchestrator
        .handle_turn(&id, TurnInput::text("material=steel length=6000"))
        .await;
    let response = orchestrator
        .handle_turn(&id, TurnInput::action(TurnAction::Optimize))
        .await;

    assert_eq!(response.phase, Phase::GatheringInfo);
    assert_eq!(response.missing_fields, before.missing_fields);
    assert_eq!(response.specification, before.specification);
    assert_eq!(
        response.message.kind,
        MessageKind::Guidance {
            requested: "optimize".to_string(),
            phase: Phase::GatheringInfo,
        }
    );
    assert!(response.message.text.contains("Cannot optimize while GATHERING_INFO"));
}

#[tokio::test]
async fn test_full_flow_records_optimized_design() {
    let corpus = Arc::new(MemoryDesignCorpus::with_rows(vec![steel_row()]));
    let orchestrator = orchestrator(&corpus);
    let id = SessionId::from("b");

    orchestrator.handle_turn(&id, TurnInput::text(REFERENCE_BEAM)).await;

    let history = orchestrator.handle_turn(&id, TurnInput::text("yes please")).await;
    assert_eq!(history.phase, Phase::HistoryResults);
    assert_eq!(history.message.kind, MessageKind::HistoryFound);
    match &history.comparison {
        Some(ComparisonOutcome::Found(comparison)) => {
            assert_eq!(comparison.alternative.width_mm, 100.0);
            assert!(!comparison.is_optimized_design());
        }
        other => panic!("expected an alternative, got {:?}", other),
    }

    let optimized = orchestrator
        .handle_turn(&id, TurnInput::action(TurnAction::Optimize))
        .await;
    assert_eq!(optimized.phase, Phase::Completed);
    assert_eq!(optimized.message.kind, MessageKind::OptimizationSucceeded);
    assert!(optimized.degraded.is_empty());
    match &optimized.optimization {
        Some(OptimizationReport::Optimized(result)) => {
            assert!(result.deflection_mm <= result.limit_mm);
            assert_eq!(result.baseline.kind, BaselineKind::NaiveUpsized);
            assert!(result.volume_saved_pct > 80.0);
        }
        other => panic!("expected a result, got {:?}", other),
    }

    let rows = corpus.load().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].provenance, Provenance::Optimized);
    assert_eq!(rows[1].status, DesignStatus::Pass);
    assert!(rows[1].recorded_at.is_some());
}

#[tokio::test]
async fn test_next_session_sees_previous_optimum() {
    let corpus = Arc::new(MemoryDesignCorpus::with_rows(vec![steel_row()]));
    let orchestrator = orchestrator(&corpus);

    let first = SessionId::from("first");
    orchestrator.handle_turn(&first, TurnInput::text(REFERENCE_BEAM)).await;
    orchestrator.handle_turn(&first, TurnInput::text("yes")).await;
    orchestrator.handle_turn(&first, TurnInput::text("yes")).await;

    let second = SessionId::from("second");
    orchestrator.handle_turn(&second, TurnInput::text(REFERENCE_BEAM)).await;
    let history = orchestrator.handle_turn(&second, TurnInput::text("yes")).await;

    match &history.comparison {
        Some(ComparisonOutcome::Found(comparison)) => assert!(comparison.is_optimized_design()),
        other => panic!("expected an alternative, got {:?}", other),
    }
    assert!(history.message.text.contains("previously optimized"));
}

#[tokio::test]
async fn test_decline_and_completed_acknowledgement() {
    let corpus = Arc::new(MemoryDesignCorpus::with_rows(vec![steel_row()]));
    let orchestrator = orchestrator(&corpus);
    let id = SessionId::from("e");

    orchestrator.handle_turn(&id, TurnInput::text(REFERENCE_BEAM)).await;
    let reoffer = orchestrator.handle_turn(&id, TurnInput::text("what is a beam?")).await;
    assert_eq!(reoffer.phase, Phase::Analyzing);
    assert_eq!(reoffer.message.kind, MessageKind::OfferHistory);

    orchestrator.handle_turn(&id, TurnInput::text("yes")).await;
    let declined = orchestrator.handle_turn(&id, TurnInput::text("no thanks")).await;
    assert_eq!(declined.phase, Phase::Completed);
    assert_eq!(declined.message.kind, MessageKind::Completed);
    assert_eq!(declined.optimization, None);

    let ack = orchestrator.handle_turn(&id, TurnInput::text("thanks")).await;
    assert_eq!(ack.phase, Phase::Completed);
    assert_eq!(ack.message.kind, MessageKind::Completed);

    let fresh = orchestrator
        .handle_turn(&id, TurnInput::text("new design: material=wood"))
        .await;
    assert_eq!(fresh.phase, Phase::GatheringInfo);
    assert_eq!(fresh.specification.material, Some(Material::Wood));
    assert_eq!(fresh.message.kind, MessageKind::AskField { field: SpecField::Length });
}

#[tokio::test]
async fn test_double_reset_yields_same_fresh_state() {
    let corpus = Arc::new(MemoryDesignCorpus::new());
    let orchestrator = orchestrator(&corpus);
    let id = SessionId::from("r");

    orchestrator.handle_turn(&id, TurnInput::text(REFERENCE_BEAM)).await;
    let completed = orchestrator.handle_turn(&id, TurnInput::text("yes")).await;
    assert_eq!(completed.phase, Phase::Completed);

    let first = orchestrator
        .handle_turn(&id, TurnInput::action(TurnAction::Reset))
        .await;
    let after_first = orchestrator.session_snapshot(&id).await.unwrap();
    let second = orchestrator
        .handle_turn(&id, TurnInput::action(TurnAction::Reset))
        .await;
    let after_second = orchestrator.session_snapshot(&id).await.unwrap();

    assert_eq!(after_first, after_second);
    assert_eq!(after_first, ConversationState::new(id.clone()));
    assert_eq!(first.message.kind, MessageKind::SessionReset);
    assert_eq!(second.phase, Phase::GatheringInfo);
}

#[tokio::test]
async fn test_unavailable_corpus_degrades_but_still_optimizes() {
    let corpus = Arc::new(MemoryDesignCorpus::with_rows(vec![steel_row()]));
    corpus.set_unavailable(true);
    let orchestrator = orchestrator(&corpus);
    let id = SessionId::from("u");

    orchestrator.handle_turn(&id, TurnInput::text(REFERENCE_BEAM)).await;
    let history = orchestrator.handle_turn(&id, TurnInput::text("yes")).await;

    assert_eq!(history.phase, Phase::HistoryResults);
    assert!(matches!(history.comparison, Some(ComparisonOutcome::Unavailable { .. })));
    assert!(matches!(history.message.kind, MessageKind::HistoryUnavailable { .. }));
    assert!(matches!(
        history.degraded.as_slice(),
        [DegradedSignal::CorpusUnavailable { .. }]
    ));

    let optimized = orchestrator.handle_turn(&id, TurnInput::text("yes")).await;
    assert_eq!(optimized.phase, Phase::Completed);
    assert_eq!(optimized.message.kind, MessageKind::OptimizationSucceeded);
    assert!(optimized
        .degraded
        .iter()
        .any(|s| matches!(s, DegradedSignal::AppendFailed { .. })));

    corpus.set_unavailable(false);
    assert_eq!(corpus.len().await, 1);
}

#[tokio::test]
async fn test_german_turns_get_german_messages() {
    let corpus = Arc::new(MemoryDesignCorpus::new());
    let orchestrator = orchestrator(&corpus);
    let id = SessionId::from("de");

    let response = orchestrator
        .handle_turn(
            &id,
            TurnInput::text("Stahl, Länge 6 m, Last 20 kN, Breite 200, Höhe 100"),
        )
        .await;

    assert_eq!(response.phase, Phase::Analyzing);
    assert_eq!(response.message.language, Language::De);
    assert!(response.message.text.contains("Durchbiegung"));

    // numbers alone keep the session language
    let reoffer = orchestrator.handle_turn(&id, TurnInput::text("42")).await;
    assert_eq!(reoffer.message.language, Language::De);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reset_during_optimization_discards_result() {
    let corpus = Arc::new(MemoryDesignCorpus::with_rows(vec![steel_row()]));
    let shared: Arc<dyn DesignCorpus> = corpus.clone();
    let orchestrator = Arc::new(PhaseOrchestrator::local(
        shared,
        slow_optimizer(Duration::from_millis(400)),
    ));
    let id = SessionId::from("g");

    orchestrator.handle_turn(&id, TurnInput::text(REFERENCE_BEAM)).await;
    orchestrator.handle_turn(&id, TurnInput::text("yes")).await;

    let turn = {
        let orchestrator = Arc::clone(&orchestrator);
        let id = id.clone();
        tokio::spawn(async move { orchestrator.handle_turn(&id, TurnInput::text("yes")).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    let reset = orchestrator.reset_session(&id).await.unwrap();
    let response = turn.await.unwrap();

    assert_eq!(response.message.kind, MessageKind::OptimizationDiscarded);
    assert_eq!(response.optimization, None);
    assert_eq!(reset.phase, Phase::GatheringInfo);
    assert_eq!(corpus.len().await, 1);
    let state = orchestrator.session_snapshot(&id).await.unwrap();
    assert_eq!(state.phase, Phase::GatheringInfo);
    assert!(state.last_optimization.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reset_text_during_optimization_discards_result() {
    let corpus = Arc::new(MemoryDesignCorpus::with_rows(vec![steel_row()]));
    let shared: Arc<dyn DesignCorpus> = corpus.clone();
    let orchestrator = Arc::new(PhaseOrchestrator::local(
        shared,
        slow_optimizer(Duration::from_millis(400)),
    ));
    let id = SessionId::from("text-reset");

    orchestrator.handle_turn(&id, TurnInput::text(REFERENCE_BEAM)).await;
    orchestrator.handle_turn(&id, TurnInput::text("yes")).await;

    let turn = {
        let orchestrator = Arc::clone(&orchestrator);
        let id = id.clone();
        tokio::spawn(async move { orchestrator.handle_turn(&id, TurnInput::text("yes")).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    let reset = orchestrator.handle_turn(&id, TurnInput::text("reset")).await;
    let response = turn.await.unwrap();

    assert_eq!(response.message.kind, MessageKind::OptimizationDiscarded);
    assert_eq!(response.optimization, None);
    assert_eq!(reset.message.kind, MessageKind::SessionReset);
    assert_eq!(reset.phase, Phase::GatheringInfo);
    assert_eq!(corpus.len().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_optimization_timeout_is_reported() {
    let corpus = Arc::new(MemoryDesignCorpus::with_rows(vec![steel_row()]));
    let shared: Arc<dyn DesignCorpus> = corpus.clone();
    let orchestrator = PhaseOrchestrator::local(shared, slow_optimizer(Duration::from_millis(500)))
        .with_turn_timeout(Duration::from_millis(50));
    let id = SessionId::from("t");

    orchestrator.handle_turn(&id, TurnInput::text(REFERENCE_BEAM)).await;
    orchestrator.handle_turn(&id, TurnInput::text("yes")).await;
    let response = orchestrator.handle_turn(&id, TurnInput::text("yes")).await;

    assert_eq!(response.phase, Phase::Completed);
    assert_eq!(response.message.kind, MessageKind::OptimizationFailed);
    assert!(response
        .degraded
        .iter()
        .any(|s| matches!(s, DegradedSignal::OptimizationTimedOut { .. })));
    assert_eq!(corpus.len().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_turns_of_one_session_run_in_order() {
    let corpus = Arc::new(MemoryDesignCorpus::new());
    let shared: Arc<dyn DesignCorpus> = corpus.clone();
    let orchestrator = Arc::new(PhaseOrchestrator::new(
        shared,
        optimizer(),
        Arc::new(SlowExtractor(Duration::from_millis(150))),
        Arc::new(KeywordIntentClassifier::new()),
    ));
    let id = SessionId::from("fifo");

    let gather = {
        let orchestrator = Arc::clone(&orchestrator);
        let id = id.clone();
        tokio::spawn(async move { orchestrator.handle_turn(&id, TurnInput::text(REFERENCE_BEAM)).await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;

    // another session is not held up by the slow turn
    let other = tokio::time::timeout(
        Duration::from_millis(100),
        orchestrator.handle_turn(
            &SessionId::from("other"),
            TurnInput::action(TurnAction::Reset),
        ),
    )
    .await
    .expect("independent session");
    assert_eq!(other.phase, Phase::GatheringInfo);

    // queued behind the gathering turn, so the session is already analyzed
    let history = orchestrator
        .handle_turn(&id, TurnInput::action(TurnAction::ShowHistory))
        .await;
    let gathered = gather.await.unwrap();

    assert_eq!(gathered.phase, Phase::Analyzing);
    assert_eq!(history.message.kind, MessageKind::NoAlternativeFound);
    assert_eq!(history.phase, Phase::Completed);
}

#[tokio::test]
async fn test_parallel_sessions_keep_separate_state() {
    let corpus = Arc::new(MemoryDesignCorpus::new());
    let orchestrator = orchestrator(&corpus);

    let turns = ["material=steel", "material=wood length=4000", REFERENCE_BEAM];
    let responses = futures::future::join_all(turns.iter().enumerate().map(|(i, text)| {
        let id = SessionId::new(format!("s{}", i));
        let orchestrator = &orchestrator;
        async move { orchestrator.handle_turn(&id, TurnInput::text(*text)).await }
    }))
    .await;

    assert_eq!(orchestrator.session_count(), 3);
    assert_eq!(responses[0].missing_fields.len(), 4);
    assert_eq!(responses[1].missing_fields.len(), 3);
    assert_eq!(responses[1].specification.material, Some(Material::Wood));
    assert_eq!(responses[2].phase, Phase::Analyzing);
}

#[tokio::test]
async fn test_optimized_design_is_written_to_corpus_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("historical_designs.csv");
    let corpus: Arc<dyn DesignCorpus> = Arc::new(FileDesignCorpus::new(&path));
    let orchestrator = PhaseOrchestrator::local(Arc::clone(&corpus), optimizer());
    let id = SessionId::from("file");

    orchestrator.handle_turn(&id, TurnInput::text(REFERENCE_BEAM)).await;
    // the file does not exist yet
    let history = orchestrator.handle_turn(&id, TurnInput::text("yes")).await;
    assert_eq!(history.phase, Phase::HistoryResults);
    assert!(matches!(
        history.message.kind,
        MessageKind::HistoryUnavailable { .. }
    ));

    let optimized = orchestrator.handle_turn(&id, TurnInput::text("yes")).await;
    assert_eq!(optimized.phase, Phase::Completed);
    assert_eq!(optimized.message.kind, MessageKind::OptimizationSucceeded);
    assert!(!optimized
        .degraded
        .iter()
        .any(|d| matches!(d, DegradedSignal::AppendFailed { .. })));

    let rows = corpus.load().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].provenance, Provenance::Optimized);
    assert_eq!(rows[0].status, DesignStatus::Pass);
    assert!(rows[0].recorded_at.is_some());
}
