//! Port trait definitions
//!
//! These traits define the interfaces that external collaborators and
//! adapters must implement.

pub mod extraction;
pub mod model;

pub use extraction::{FieldExtractor, IntentClassifier};
pub use model::{DeflectionPredictor, ModelAvailability, ModelLoader};
