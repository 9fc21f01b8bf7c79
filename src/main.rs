//! `gemchat` - a personal terminal chat client for Google Gemini
//!
//! This binary wires the pieces together: parse arguments, load
//! configuration, resolve the credential, then hand one `Session` and one
//! `GeminiGateway` to the TUI for the lifetime of the interactive session.

use anyhow::{Context, Result};
use clap::Parser;
use console::Style;
use std::io::IsTerminal;
use std::sync::Arc;

use crate::cli::Cli;
use crate::tui::app::App;
use gemchat_core::config::{Config, OpenPolicy, API_KEY_ENV_VAR};
use gemchat_core::gateway::GeminiGateway;
use gemchat_core::session::Session;

mod cli;
mod tui;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        let blue = Style::new().blue();
        println!(
            "{} v{} ({})",
            blue.apply_to("gemchat"),
            env!("CARGO_PKG_VERSION"),
            env!("GIT_HASH")
        );
        return Ok(());
    }

    // Load configuration and apply command-line overrides
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(model) = &cli.model {
        config.model = model.clone();
    }
    if cli.eager {
        config.open_policy = OpenPolicy::Eager;
    } else if cli.lazy {
        config.open_policy = OpenPolicy::Lazy;
    }

    // Credential resolution: flag, then env var / config file, then an
    // interactive masked prompt. An empty answer leaves the session gated;
    // the TUI shows the warning instead of chatting.
    let api_key = cli
        .api_key
        .clone()
        .or_else(|| config.resolve_api_key())
        .or_else(prompt_for_api_key);

    let gateway = GeminiGateway::new(&config).context("Failed to create model gateway")?;
    let mut session = Session::new(api_key, config.open_policy);

    // Eager policy: open the conversation up front so credential problems
    // surface before the first message. The failure is not fatal; it is
    // shown as a banner and the key can be fixed without restarting.
    let mut startup_error = None;
    if config.open_policy == OpenPolicy::Eager && session.credential().is_some() {
        if let Err(err) = session.open(&gateway).await {
            startup_error = Some(err);
        }
    }

    let mut app = App::new(session, Arc::new(gateway), config.model.clone());
    if let Some(err) = startup_error {
        app.show_error(&err);
    }

    tui::run(app).await.context("TUI session failed")?;
    Ok(())
}

/// Masked interactive prompt for the API key. Only offered on a real
/// terminal; returns `None` when the user just presses enter.
fn prompt_for_api_key() -> Option<String> {
    if !std::io::stdin().is_terminal() {
        return None;
    }

    let yellow = Style::new().yellow();
    println!(
        "{}",
        yellow.apply_to(format!(
            "No API key found. Set {} or add it to the config file to skip this prompt.",
            API_KEY_ENV_VAR
        ))
    );

    dialoguer::Password::new()
        .with_prompt("Google AI API key (enter to skip)")
        .allow_empty_password(true)
        .interact()
        .ok()
        .filter(|key| !key.trim().is_empty())
}
