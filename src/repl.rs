use std::future::Future;
use std::io::{self, BufRead, Write};
use std::thread;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::warn;

use crate::chatbot::Chatbot;
use crate::commands::{Command, HELP_TEXT, Input, parse_input};
use crate::completion::CompletionClient;
use crate::error::ChatError;
use crate::model::Message;

const FAREWELL: &str = "Goodbye!";

pub type InputLines = mpsc::UnboundedReceiver<io::Result<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(['\n', '\r'])
        .to_string()
}

/// Reads stdin on a detached thread so the loop can wait on a line and an
/// interrupt at the same time. Bytes that are not UTF-8 are replaced rather
/// than rejected; a read error is forwarded once and ends the reader.
pub fn spawn_stdin_lines() -> InputLines {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        let mut stdin = io::stdin().lock();
        let mut raw = Vec::new();
        loop {
            raw.clear();
            let line = match stdin.read_until(b'\n', &mut raw) {
                Ok(0) => break,
                Ok(_) => Ok(decode_line(&raw)),
                Err(err) => Err(err),
            };
            let failed = line.is_err();
            if tx.send(line).is_err() || failed {
                break;
            }
        }
    });
    rx
}

/// Resolves on Ctrl-C. If the handler cannot be installed the loop simply
/// runs without one.
pub async fn interrupted() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for interrupt signal");
        std::future::pending::<()>().await;
    }
}

pub async fn run_repl<C, W, F>(
    bot: &mut Chatbot<C>,
    lines: &mut InputLines,
    out: &mut W,
    interrupt: F,
) -> Result<()>
where
    C: CompletionClient,
    W: Write,
    F: Future<Output = ()>,
{
    tokio::pin!(interrupt);

    writeln!(out, "NLP chatbot")?;
    writeln!(out, "model: {}", bot.model())?;
    writeln!(out, "type '/help' for commands or start chatting")?;

    loop {
        write!(out, "\nyou> ")?;
        out.flush().context("Failed to flush stdout")?;

        let next = tokio::select! {
            biased;
            _ = &mut interrupt => {
                writeln!(out, "\n\n{FAREWELL}")?;
                break;
            }
            next = lines.recv() => next,
        };
        let line = match next {
            Some(Ok(line)) => line,
            Some(Err(err)) => {
                warn!(error = %err, "failed to read input line");
                writeln!(out, "error: could not read input: {err}")?;
                continue;
            }
            None => {
                writeln!(out, "\n{FAREWELL}")?;
                break;
            }
        };

        match parse_input(&line) {
            Input::Empty => continue,
            Input::Command(command) => {
                if execute(bot, command, out)? == Flow::Quit {
                    break;
                }
            }
            Input::Chat(text) => {
                let result = tokio::select! {
                    biased;
                    _ = &mut interrupt => {
                        writeln!(out, "\n\n{FAREWELL}")?;
                        break;
                    }
                    result = bot.send(&text) => result,
                };
                match result {
                    Ok(reply) => writeln!(out, "assistant> {}", reply.trim())?,
                    Err(err) => report(out, &err)?,
                }
            }
        }
    }

    out.flush().context("Failed to flush stdout")?;
    Ok(())
}

fn execute<C, W>(bot: &mut Chatbot<C>, command: Command, out: &mut W) -> io::Result<Flow>
where
    C: CompletionClient,
    W: Write,
{
    match command {
        Command::Help => writeln!(out, "{HELP_TEXT}")?,
        Command::Clear => match bot.clear() {
            Ok(()) => writeln!(out, "conversation history cleared")?,
            Err(err) => report(out, &err)?,
        },
        Command::Save(name) => match bot.save(name.as_deref()) {
            Ok(path) => writeln!(out, "conversation saved to {}", path.display())?,
            Err(err) => report(out, &err)?,
        },
        Command::Load(None) => writeln!(out, "please specify a filename: /load <file>")?,
        Command::Load(Some(name)) => match bot.load(&name) {
            Ok(count) => writeln!(out, "loaded {count} messages from {name}")?,
            Err(err) => report(out, &err)?,
        },
        Command::History => print_history(out, bot.history())?,
        Command::Model => writeln!(out, "current model: {}", bot.model())?,
        Command::Quit => {
            writeln!(out, "{FAREWELL}")?;
            return Ok(Flow::Quit);
        }
        Command::Unknown(token) => report(out, &ChatError::UnknownCommand(token))?,
    }
    Ok(Flow::Continue)
}

fn report<W: Write>(out: &mut W, err: &ChatError) -> io::Result<()> {
    warn!(error = %err, "chat command failed");
    writeln!(out, "error: {err}")
}

fn print_history<W: Write>(out: &mut W, history: &[Message]) -> io::Result<()> {
    if history.is_empty() {
        return writeln!(out, "(history is empty)");
    }

    for (idx, msg) in history.iter().enumerate() {
        writeln!(out, "[{}] {}: {}", idx, msg.role.as_str(), msg.content)?;
    }
    Ok(())
}
