use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ExtractedFields, Intent, Phase};

/// Port for pulling beam fields out of a user turn
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    /// Extract any subset of the specification fields
    ///
    /// # Arguments
    /// * `text` - Free text of the turn
    /// * `uploaded` - Uploaded field document, if the turn carried one
    ///
    /// # Returns
    /// Loosely typed fields; the caller validates them
    async fn extract(&self, text: &str, uploaded: Option<&serde_json::Value>)
        -> Result<ExtractedFields>;
}

/// Port for classifying what a turn asks for
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Classify a turn, given the phase the session is in
    async fn classify(&self, text: &str, phase: Phase) -> Result<Intent>;
}
