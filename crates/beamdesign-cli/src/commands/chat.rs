//! Chat command: a line-oriented session against the phase orchestrator.
//!
//! Plain lines are sent as free text. Lines starting with `:` are commands:
//! `:upload FILE [text]`, `:history`, `:optimize`, `:decline`, `:new`,
//! `:reset`, `:state`, `:help` and `:quit`.

use super::Services;
use crate::cli::ChatArgs;
use crate::output::OutputWriter;
use anyhow::{bail, Context, Result};
use beamdesign_agent::{MessageKind, PhaseOrchestrator, TurnInput, TurnResponse};
use beamdesign_core::config::LayeredConfig;
use beamdesign_core::models::{SessionId, TurnAction};
use beamdesign_store::DesignCorpus;
use console::style;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

const EVICTION_INTERVAL: Duration = Duration::from_secs(60);

const HELP: &str = "Commands: :upload FILE [text], :history, :optimize, :decline, :new, :reset, :state, :quit";

/// What one input line asks for
#[derive(Debug)]
enum ChatLine {
    Turn(TurnInput),
    State,
    Help,
    Quit,
    Empty,
}

fn read_upload(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn parse_line(line: &str) -> Result<ChatLine> {
    let line = line.trim();
    let Some(command) = line.strip_prefix(':') else {
        return Ok(if line.is_empty() {
            ChatLine::Empty
        } else {
            ChatLine::Turn(TurnInput::text(line))
        });
    };

    let (name, rest) = command
        .split_once(char::is_whitespace)
        .map(|(name, rest)| (name, rest.trim()))
        .unwrap_or((command, ""));

    let line = match name {
        "upload" => {
            let (file, text) = rest
                .split_once(char::is_whitespace)
                .map(|(file, text)| (file, text.trim()))
                .unwrap_or((rest, ""));
            if file.is_empty() {
                bail!("usage: :upload FILE [text]");
            }
            ChatLine::Turn(TurnInput::text(text).with_upload(read_upload(Path::new(file))?))
        }
        "history" => ChatLine::Turn(TurnInput::action(TurnAction::ShowHistory)),
        "optimize" => ChatLine::Turn(TurnInput::action(TurnAction::Optimize)),
        "decline" => ChatLine::Turn(TurnInput::action(TurnAction::Decline)),
        "new" => ChatLine::Turn(TurnInput {
            action: Some(TurnAction::NewDesign),
            ..TurnInput::text(rest)
        }),
        "reset" => ChatLine::Turn(TurnInput::action(TurnAction::Reset)),
        "state" => ChatLine::State,
        "help" | "?" => ChatLine::Help,
        "quit" | "exit" | "q" => ChatLine::Quit,
        other => bail!("unknown command ':{}'", other),
    };
    Ok(line)
}

fn needs_attention(response: &TurnResponse) -> bool {
    !response.degraded.is_empty()
        || matches!(
            response.message.kind,
            MessageKind::InvalidField { .. }
                | MessageKind::Guidance { .. }
                | MessageKind::Unavailable { .. }
                | MessageKind::OptimizationFailed
                | MessageKind::OptimizationDiscarded
        )
}

fn show(response: &TurnResponse, output: &OutputWriter) -> Result<()> {
    if output.is_json() {
        println!("{}", serde_json::to_string(response)?);
        return Ok(());
    }

    output.reply(&response.message.text, needs_attention(response));
    for signal in &response.degraded {
        output.warning(format!("{:?}", signal));
    }
    let actions: Vec<String> = response.next_actions.iter().map(|a| a.to_string()).collect();
    println!(
        "{}",
        style(format!("[{}] next: {}", response.phase, actions.join(", "))).dim()
    );
    Ok(())
}

pub async fn execute(args: ChatArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let services = Services::from_config(config, output);
    let corpus_location = services.corpus.describe();
    let corpus: Arc<dyn DesignCorpus> = services.corpus;

    let orchestrator = Arc::new(
        PhaseOrchestrator::local(corpus, services.optimizer)
            .with_comparison(services.comparison)
            .with_turn_timeout(config.turn_timeout())
            .with_idle_timeout(config.session_idle_timeout()),
    );
    let eviction = orchestrator.spawn_eviction_task(EVICTION_INTERVAL);

    let session_id =
        SessionId::new(args.session.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()));
    tracing::info!(session_id = %session_id, corpus = %corpus_location, "Starting chat session");

    if !output.is_json() {
        output.info(format!("Session {} (corpus: {})", session_id, corpus_location));
        output.info("Describe the beam: material, length, load, width and height.");
        output.info(HELP);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let parsed = match parse_line(&line) {
            Ok(parsed) => parsed,
            Err(e) => {
                output.error(e);
                continue;
            }
        };

        match parsed {
            ChatLine::Quit => break,
            ChatLine::Empty => continue,
            ChatLine::Help => output.info(HELP),
            ChatLine::State => match orchestrator.session_snapshot(&session_id).await {
                Some(state) => output.result(state)?,
                None => output.info("No session state yet"),
            },
            ChatLine::Turn(input) => {
                let response = orchestrator.handle_turn(&session_id, input).await;
                show(&response, output)?;
            }
        }
    }

    orchestrator.clear_session(&session_id);
    eviction.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_plain_text_is_a_turn() {
        match parse_line("  steel, 6 m  ").unwrap() {
            ChatLine::Turn(input) => {
                assert_eq!(input.text, "steel, 6 m");
                assert!(input.action.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_commands_map_to_actions() {
        let action = |line: &str| match parse_line(line).unwrap() {
            ChatLine::Turn(input) => input.action,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(action(":optimize"), Some(TurnAction::Optimize));
        assert_eq!(action(":history"), Some(TurnAction::ShowHistory));
        assert_eq!(action(":reset"), Some(TurnAction::Reset));
        assert_eq!(action(":new material=wood"), Some(TurnAction::NewDesign));
        assert!(matches!(parse_line(":quit").unwrap(), ChatLine::Quit));
        assert!(matches!(parse_line("   ").unwrap(), ChatLine::Empty));
        assert!(parse_line(":frobnicate").is_err());
    }

    #[test]
    fn test_upload_reads_json_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"Material": "Steel", "Length": "6 m"}}"#).unwrap();
        let line = format!(":upload {} load=20kN", file.path().display());

        match parse_line(&line).unwrap() {
            ChatLine::Turn(input) => {
                assert_eq!(input.text, "load=20kN");
                let uploaded = input.uploaded_fields.unwrap();
                assert_eq!(uploaded["Material"], "Steel");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_upload_of_missing_file_fails() {
        assert!(parse_line(":upload /nonexistent/fields.json").is_err());
        assert!(parse_line(":upload").is_err());
    }
}
