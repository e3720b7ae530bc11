use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{HttpDeckService, SessionController, SessionEvent};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::{self, error::RecvError},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod render;

use commands::{dispatch_intent, parse_command, Command, Intent, HELP};
use config::load_settings;
use render::{render_error, render_session};

#[derive(Parser, Debug)]
#[command(about = "Draw cards from a remotely shuffled deck")]
struct Args {
    /// Base url of the deck API, e.g. http://127.0.0.1:8080/api
    #[arg(long)]
    deck_api_url: Option<String>,
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout is the rendered view
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let settings = load_settings().with_overrides(args.deck_api_url, args.timeout_secs);
    let service = HttpDeckService::new(&settings.deck_api_url, settings.request_timeout())
        .context("failed to set up deck service client")?;
    info!(deck_api_url = %service.base_url(), "deck service configured");

    let controller = SessionController::new(Arc::new(service));
    let renderer = tokio::spawn(render_events(controller.subscribe_events()));

    println!("{HELP}");
    dispatch_intent(&controller, Intent::Reshuffle);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => break,
            Ok(Some(Command::Draw)) => dispatch_intent(&controller, Intent::Draw),
            Ok(Some(Command::Reshuffle)) => dispatch_intent(&controller, Intent::Reshuffle),
            Ok(Some(Command::Select(index))) => {
                if let Err(err) = controller.select_history_entry(index).await {
                    println!("{err}");
                }
            }
            Ok(Some(Command::Show)) => print!("{}", render_session(&controller.snapshot().await)),
            Ok(Some(Command::Help)) => println!("{HELP}"),
            Err(err) => println!("{err}"),
        }
    }

    renderer.abort();
    Ok(())
}

async fn render_events(mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(SessionEvent::StateChanged(session)) => print!("{}", render_session(&session)),
            Ok(SessionEvent::Error(err)) => println!("{}", render_error(&err)),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "renderer fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
}
