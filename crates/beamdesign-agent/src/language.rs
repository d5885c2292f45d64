//! Per-turn language detection

use beamdesign_core::models::Language;

const GERMAN_WORDS: &[&str] = &[
    "ja", "nein", "bitte", "danke", "gerne", "träger", "traeger", "länge", "laenge", "höhe",
    "hoehe", "breite", "stahl", "holz", "beton", "zeig", "zeige", "optimieren", "neuer", "neues",
    "neustart", "vorne", "zurücksetzen", "und", "ich", "ein", "eine", "der", "das", "ist",
    "nicht", "mit", "einzellast", "streckenlast",
];

/// Language of a turn, or `None` when the text carries no words
/// (numbers only, or empty) and the session should keep its language.
pub fn detect(text: &str) -> Option<Language> {
    if !text.chars().any(char::is_alphabetic) {
        return None;
    }
    if text.chars().any(|c| matches!(c, 'ä' | 'ö' | 'ü' | 'Ä' | 'Ö' | 'Ü' | 'ß')) {
        return Some(Language::De);
    }

    let lower = text.to_lowercase();
    let german = lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| GERMAN_WORDS.contains(&word));
    Some(if german { Language::De } else { Language::En })
}
