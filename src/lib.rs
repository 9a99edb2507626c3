pub mod chatbot;
pub mod commands;
pub mod completion;
pub mod config;
pub mod conversation;
pub mod error;
pub mod logging;
pub mod model;
pub mod providers;
pub mod repl;

#[cfg(test)]
mod test_support;

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use tracing::{info, warn};

use chatbot::Chatbot;
use config::{API_KEY_VAR, Config};
use error::ChatError;
use providers::openrouter::OpenRouterClient;
use repl::{interrupted, run_repl, spawn_stdin_lines};

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let _log_guard = logging::init();

    let cfg = Config::from_env();
    info!(
        model = %cfg.model,
        api_url = %cfg.api_url,
        request_timeout_secs = cfg.request_timeout_secs,
        history_window = ?cfg.history_window,
        "loaded runtime configuration"
    );

    let api_key = resolve_api_key(
        cfg.api_key.clone(),
        &mut io::stdin().lock(),
        &mut io::stdout(),
    )?;
    let client = OpenRouterClient::new(&cfg, api_key)?;
    let mut bot = Chatbot::new(client, &cfg);

    let mut lines = spawn_stdin_lines();
    run_repl(&mut bot, &mut lines, &mut io::stdout(), interrupted()).await
}

/// Uses the configured key, otherwise asks for one on `input`.
pub fn resolve_api_key<R, W>(
    configured: Option<String>,
    input: &mut R,
    out: &mut W,
) -> Result<String>
where
    R: BufRead,
    W: Write,
{
    if let Some(key) = configured {
        return Ok(key);
    }

    writeln!(out, "{API_KEY_VAR} is not set.")?;
    write!(out, "Please enter your OpenRouter API key: ")?;
    out.flush().context("Failed to flush stdout")?;

    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .context("Failed to read API key from stdin")?;
    let key = answer.trim();
    if key.is_empty() {
        warn!("no API key provided");
        return Err(ChatError::CredentialMissing.into());
    }
    Ok(key.to_string())
}
