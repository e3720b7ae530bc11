//! Terminal commands and their dispatch onto the session controller.

use std::sync::Arc;

use client_core::{IntentOutcome, SessionController};
use thiserror::Error;
use tracing::debug;

pub const HELP: &str = "\
commands:
  draw | d           draw one card
  shuffle | r        shuffle a new deck (clears history)
  select N | s N     highlight history entry N (0 = newest)
  show               print the current session
  help               show this help
  quit | q           exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Draw,
    Reshuffle,
    Select(usize),
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("select needs a history index")]
    MissingIndex,
    #[error("'{0}' is not a history index")]
    InvalidIndex(String),
    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),
}

/// Remote intents run as their own tasks so the prompt stays responsive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Draw,
    Reshuffle,
}

/// Parses one input line; blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let command = match verb.to_ascii_lowercase().as_str() {
        "draw" | "d" => Command::Draw,
        "shuffle" | "restart" | "r" => Command::Reshuffle,
        "show" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        "select" | "s" => {
            let raw = words.next().ok_or(CommandError::MissingIndex)?;
            let index = raw
                .parse::<usize>()
                .map_err(|_| CommandError::InvalidIndex(raw.to_string()))?;
            Command::Select(index)
        }
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    if let Some(extra) = words.next() {
        return Err(CommandError::UnexpectedArgument(extra.to_string()));
    }
    Ok(Some(command))
}

pub fn dispatch_intent(controller: &Arc<SessionController>, intent: Intent) {
    let controller = Arc::clone(controller);
    tokio::spawn(async move {
        let outcome = match intent {
            Intent::Draw => controller.draw_one().await,
            Intent::Reshuffle => controller.reshuffle().await,
        };
        debug!(?intent, ?outcome, "intent finished");
        if outcome == IntentOutcome::Ignored {
            println!("busy: wait for the current request to finish");
        }
    });
}
