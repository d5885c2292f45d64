//! Beamdesign Agent - Conversation phase machine for beam design sessions
//!
//! The [`PhaseOrchestrator`] owns the session store and drives each session
//! through gathering, analysis, history comparison and optimization. The
//! local extractor and classifier implement the same ports as a hosted
//! language model and need no network access.

pub mod extract;
pub mod intent;
pub mod language;
pub mod messages;
pub mod orchestrator;
pub mod session;

pub use extract::LocalFieldExtractor;
pub use intent::KeywordIntentClassifier;
pub use messages::{MessageKind, MessagePayload};
pub use orchestrator::{DegradedSignal, PhaseOrchestrator, TurnInput, TurnResponse};
pub use session::{SessionSlot, SessionStore};
