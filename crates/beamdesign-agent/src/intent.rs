//! Keyword intent classifier for English and German turns

use async_trait::async_trait;
use beamdesign_core::error::Result;
use beamdesign_core::models::{Intent, Phase};
use beamdesign_core::ports::IntentClassifier;

const RESET_PHRASES: &[&str] = &[
    "reset",
    "restart",
    "start over",
    "von vorne",
    "neustart",
    "zurücksetzen",
    "clear",
];

const NEW_DESIGN_PHRASES: &[&str] = &[
    "new beam",
    "new design",
    "another beam",
    "different beam",
    "neuer träger",
    "neues design",
    "anderer träger",
    "noch ein träger",
];

const DENY_PHRASES: &[&str] = &["not now", "no thanks", "nein danke", "lieber nicht"];
const DENY_WORDS: &[&str] = &["no", "nope", "nein", "nicht", "skip", "n"];

const AFFIRM_WORDS: &[&str] = &[
    "yes", "y", "yep", "yeah", "sure", "ok", "okay", "please", "show", "optimize", "optimise",
    "ja", "gerne", "zeig", "zeige", "optimieren", "go",
];

/// True when `phrase` occurs as consecutive whole words
fn has_phrase(words: &[&str], phrase: &str) -> bool {
    let needle: Vec<&str> = phrase.split_whitespace().collect();
    !needle.is_empty() && words.windows(needle.len()).any(|window| window == needle.as_slice())
}

/// Phrase and word lists; no model involved
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordIntentClassifier;

impl KeywordIntentClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify_text(&self, text: &str) -> Intent {
        let lower = text.trim().to_lowercase();
        if lower.is_empty() {
            return Intent::Unrelated;
        }
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        if RESET_PHRASES.iter().any(|p| has_phrase(&words, p)) {
            return Intent::Reset;
        }
        if NEW_DESIGN_PHRASES.iter().any(|p| has_phrase(&words, p)) {
            return Intent::NewDesign;
        }
        // negations win over "please", "show" and friends in the same turn
        if DENY_PHRASES.iter().any(|p| has_phrase(&words, p))
            || words.iter().any(|w| DENY_WORDS.contains(w))
        {
            return Intent::Deny;
        }
        if words.iter().any(|w| AFFIRM_WORDS.contains(w)) {
            return Intent::Affirm;
        }
        Intent::Unrelated
    }
}

#[async_trait]
impl IntentClassifier for KeywordIntentClassifier {
    async fn classify(&self, text: &str, _phase: Phase) -> Result<Intent> {
        Ok(self.classify_text(text))
    }
}
