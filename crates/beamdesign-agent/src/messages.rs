//! Language-tagged user messages
//!
//! Every turn response carries one [`MessagePayload`]: a machine-readable
//! [`MessageKind`] plus text rendered in the session language from the
//! session's latest results.

use beamdesign_core::models::{
    ComparisonOutcome, ConversationState, FieldIssue, Language, OptimizationCategory,
    OptimizationReport, Phase, SpecField,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageKind {
    AskField {
        field: SpecField,
    },
    InvalidField {
        issues: Vec<FieldIssue>,
        next_field: Option<SpecField>,
    },
    /// Analysis done, history comparison offered. `issues` lists values of
    /// the same turn that were not accepted.
    AnalysisReady {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        issues: Vec<FieldIssue>,
    },
    OfferHistory,
    /// Alternative shown, optimization offered
    HistoryFound,
    NoAlternativeFound,
    HistoryUnavailable {
        reason: String,
    },
    OptimizationSucceeded,
    OptimizationFailed,
    /// The session was reset while the optimization ran
    OptimizationDiscarded,
    Completed,
    SessionReset,
    Guidance {
        requested: String,
        phase: Phase,
    },
    /// A collaborator failed; the session is unchanged
    Unavailable {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub language: Language,
    #[serde(flatten)]
    pub kind: MessageKind,
    pub text: String,
}

impl MessagePayload {
    pub fn render(kind: MessageKind, state: &ConversationState) -> Self {
        let text = match state.language {
            Language::En => english(&kind, state),
            Language::De => german(&kind, state),
        };
        Self {
            language: state.language,
            kind,
            text,
        }
    }
}

fn field_label(field: SpecField, language: Language) -> &'static str {
    match (field, language) {
        (SpecField::Material, Language::En) => "material (steel, wood or concrete)",
        (SpecField::Length, Language::En) => "span length in mm",
        (SpecField::Load, Language::En) => "load in N",
        (SpecField::Width, Language::En) => "section width in mm",
        (SpecField::Height, Language::En) => "section height in mm",
        (SpecField::Material, Language::De) => "Werkstoff (Stahl, Holz oder Beton)",
        (SpecField::Length, Language::De) => "Spannweite in mm",
        (SpecField::Load, Language::De) => "Last in N",
        (SpecField::Width, Language::De) => "Querschnittsbreite in mm",
        (SpecField::Height, Language::De) => "Querschnittshöhe in mm",
    }
}

fn analysis_line(state: &ConversationState, language: Language) -> String {
    let Some(analysis) = &state.last_analysis else {
        return String::new();
    };
    match language {
        Language::En => format!(
            "Deflection {:.2} mm against a limit of {:.2} mm (L/240): {}.",
            analysis.deflection_mm, analysis.limit_mm, analysis.status
        ),
        Language::De => format!(
            "Durchbiegung {:.2} mm bei einem Grenzwert von {:.2} mm (L/240): {}.",
            analysis.deflection_mm, analysis.limit_mm, analysis.status
        ),
    }
}

fn rejected_line(issues: &[FieldIssue], label: &str) -> String {
    if issues.is_empty() {
        return String::new();
    }
    let problems: Vec<String> = issues.iter().map(|i| format!("{}: {}", i.field, i.reason)).collect();
    format!("{} ({}). ", label, problems.join("; "))
}

fn category_text(category: OptimizationCategory, language: Language) -> &'static str {
    match (category, language) {
        (OptimizationCategory::OptimizationSuccess, Language::En) => {
            "The design already passed and now uses less material."
        }
        (OptimizationCategory::DesignFeasible, Language::En) => {
            "The design already passed; no leaner section was found."
        }
        (OptimizationCategory::SafetyUpgradeEfficient, Language::En) => {
            "The section now passes and uses less material than your input."
        }
        (OptimizationCategory::SafetyUpgrade, Language::En) => {
            "The section now passes but needs more material than your input."
        }
        (OptimizationCategory::OptimizationSuccess, Language::De) => {
            "Der Entwurf war bereits zulässig und spart jetzt Material."
        }
        (OptimizationCategory::DesignFeasible, Language::De) => {
            "Der Entwurf war bereits zulässig; ein schlankerer Querschnitt wurde nicht gefunden."
        }
        (OptimizationCategory::SafetyUpgradeEfficient, Language::De) => {
            "Der Querschnitt ist jetzt zulässig und braucht weniger Material als Ihre Eingabe."
        }
        (OptimizationCategory::SafetyUpgrade, Language::De) => {
            "Der Querschnitt ist jetzt zulässig, braucht aber mehr Material als Ihre Eingabe."
        }
    }
}

fn english(kind: &MessageKind, state: &ConversationState) -> String {
    match kind {
        MessageKind::AskField { field } => {
            format!("Please provide the {}.", field_label(*field, Language::En))
        }
        MessageKind::InvalidField { issues, next_field } => {
            let problems: Vec<String> =
                issues.iter().map(|i| format!("{}: {}", i.field, i.reason)).collect();
            let mut text = format!("Some values were not accepted ({}).", problems.join("; "));
            if let Some(field) = next_field {
                text.push_str(&format!(" Please provide the {}.", field_label(*field, Language::En)));
            }
            text
        }
        MessageKind::AnalysisReady { issues } => format!(
            "{}{} Shall I look for similar designs in the history?",
            rejected_line(issues, "Not accepted"),
            analysis_line(state, Language::En)
        ),
        MessageKind::OfferHistory => {
            "Would you like to compare against historical designs? Answer yes or no.".to_string()
        }
        MessageKind::HistoryFound => match &state.last_comparison {
            Some(ComparisonOutcome::Found(c)) => {
                let origin = if c.is_optimized_design() {
                    "a previously optimized design"
                } else {
                    "a historical design"
                };
                format!(
                    "Best match is {}: {:.0} × {:.0} mm, {:.1}% less material. Shall I optimize your section?",
                    origin, c.alternative.width_mm, c.alternative.height_mm, c.efficiency.volume_saved_pct
                )
            }
            _ => "Shall I optimize your section?".to_string(),
        },
        MessageKind::NoAlternativeFound => {
            "No passing historical design with this material and length was found. Say \"new design\" to start another beam.".to_string()
        }
        MessageKind::HistoryUnavailable { reason } => format!(
            "The design history is unavailable right now ({}). Shall I optimize your section anyway?",
            reason
        ),
        MessageKind::OptimizationSucceeded => match &state.last_optimization {
            Some(OptimizationReport::Optimized(result)) => {
                let mut text = format!(
                    "Optimized section: {:.1} × {:.1} mm, deflection {:.2} mm (limit {:.2} mm), {:.1}% less material than the reference. {}",
                    result.specification.width_mm,
                    result.specification.height_mm,
                    result.deflection_mm,
                    result.limit_mm,
                    result.volume_saved_pct,
                    category_text(result.category, Language::En)
                );
                if let Some(profile) = &result.standard_alternative {
                    text.push_str(&format!(
                        " Standard profile {} would save a further {:.1}%.",
                        profile.profile.name, profile.efficiency_gain_pct
                    ));
                } else if let Some(profile) = &result.snapped_profile {
                    text.push_str(&format!(" Nearest standard profile: {}.", profile.profile.name));
                }
                text
            }
            _ => "Optimization finished.".to_string(),
        },
        MessageKind::OptimizationFailed => match &state.last_optimization {
            Some(OptimizationReport::Failed(failure)) => {
                format!("Optimization found no passing section: {}.", failure)
            }
            _ => "Optimization found no passing section.".to_string(),
        },
        MessageKind::OptimizationDiscarded => {
            "The session was reset during optimization; the result was discarded.".to_string()
        }
        MessageKind::Completed => {
            "This design is complete. Say \"new design\" or \"reset\" to start again.".to_string()
        }
        MessageKind::SessionReset => format!(
            "Starting over. Please provide the {}.",
            field_label(SpecField::Material, Language::En)
        ),
        MessageKind::Guidance { requested, phase } => format!(
            "Cannot {} while {}. Available: {}.",
            requested,
            phase,
            action_list(*phase)
        ),
        MessageKind::Unavailable { reason } => {
            format!("The request could not be completed ({}). Please try again.", reason)
        }
    }
}

fn german(kind: &MessageKind, state: &ConversationState) -> String {
    match kind {
        MessageKind::AskField { field } => {
            format!("Bitte angeben: {}.", field_label(*field, Language::De))
        }
        MessageKind::InvalidField { issues, next_field } => {
            let problems: Vec<String> =
                issues.iter().map(|i| format!("{}: {}", i.field, i.reason)).collect();
            let mut text = format!("Einige Werte wurden nicht übernommen ({}).", problems.join("; "));
            if let Some(field) = next_field {
                text.push_str(&format!(" Bitte angeben: {}.", field_label(*field, Language::De)));
            }
            text
        }
        MessageKind::AnalysisReady { issues } => format!(
            "{}{} Soll ich nach ähnlichen Entwürfen in der Historie suchen?",
            rejected_line(issues, "Nicht übernommen"),
            analysis_line(state, Language::De)
        ),
        MessageKind::OfferHistory => {
            "Möchten Sie mit historischen Entwürfen vergleichen? Antworten Sie mit ja oder nein."
                .to_string()
        }
        MessageKind::HistoryFound => match &state.last_comparison {
            Some(ComparisonOutcome::Found(c)) => {
                let origin = if c.is_optimized_design() {
                    "ein bereits optimierter Entwurf"
                } else {
                    "ein historischer Entwurf"
                };
                format!(
                    "Bester Treffer ist {}: {:.0} × {:.0} mm, {:.1}% weniger Material. Soll ich Ihren Querschnitt optimieren?",
                    origin, c.alternative.width_mm, c.alternative.height_mm, c.efficiency.volume_saved_pct
                )
            }
            _ => "Soll ich Ihren Querschnitt optimieren?".to_string(),
        },
        MessageKind::NoAlternativeFound => {
            "Kein zulässiger historischer Entwurf mit diesem Werkstoff und dieser Länge gefunden. Sagen Sie \"neuer Träger\" für einen weiteren Entwurf.".to_string()
        }
        MessageKind::HistoryUnavailable { reason } => format!(
            "Die Entwurfshistorie ist derzeit nicht verfügbar ({}). Soll ich Ihren Querschnitt trotzdem optimieren?",
            reason
        ),
        MessageKind::OptimizationSucceeded => match &state.last_optimization {
            Some(OptimizationReport::Optimized(result)) => {
                let mut text = format!(
                    "Optimierter Querschnitt: {:.1} × {:.1} mm, Durchbiegung {:.2} mm (Grenzwert {:.2} mm), {:.1}% weniger Material als die Referenz. {}",
                    result.specification.width_mm,
                    result.specification.height_mm,
                    result.deflection_mm,
                    result.limit_mm,
                    result.volume_saved_pct,
                    category_text(result.category, Language::De)
                );
                if let Some(profile) = &result.standard_alternative {
                    text.push_str(&format!(
                        " Das Standardprofil {} spart weitere {:.1}%.",
                        profile.profile.name, profile.efficiency_gain_pct
                    ));
                } else if let Some(profile) = &result.snapped_profile {
                    text.push_str(&format!(" Nächstes Standardprofil: {}.", profile.profile.name));
                }
                text
            }
            _ => "Optimierung abgeschlossen.".to_string(),
        },
        MessageKind::OptimizationFailed => match &state.last_optimization {
            Some(OptimizationReport::Failed(failure)) => {
                format!("Die Optimierung fand keinen zulässigen Querschnitt: {}.", failure)
            }
            _ => "Die Optimierung fand keinen zulässigen Querschnitt.".to_string(),
        },
        MessageKind::OptimizationDiscarded => {
            "Die Sitzung wurde während der Optimierung zurückgesetzt; das Ergebnis wurde verworfen."
                .to_string()
        }
        MessageKind::Completed => {
            "Dieser Entwurf ist abgeschlossen. Sagen Sie \"neuer Träger\" oder \"Neustart\", um neu zu beginnen.".to_string()
        }
        MessageKind::SessionReset => format!(
            "Neuer Anfang. Bitte angeben: {}.",
            field_label(SpecField::Material, Language::De)
        ),
        MessageKind::Guidance { requested, phase } => format!(
            "\"{}\" ist in der Phase {} nicht möglich. Verfügbar: {}.",
            requested,
            phase,
            action_list(*phase)
        ),
        MessageKind::Unavailable { reason } => format!(
            "Die Anfrage konnte nicht abgeschlossen werden ({}). Bitte erneut versuchen.",
            reason
        ),
    }
}

fn action_list(phase: Phase) -> String {
    phase
        .allowed_actions()
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
