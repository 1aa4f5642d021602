// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `companion chat` command implementation.
//!
//! Interactive REPL with readline history. Each line is sent through a
//! [`StreamingChatSession`] and the reply is printed as it grows. Ctrl+C
//! while a reply is streaming cancels that turn; Ctrl+C at the prompt exits.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use secrecy::SecretString;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use companion_chat::{
    HttpChatTransport, IdentityContext, SessionSettings, StreamingChatSession, Transcript,
    TurnOutcome,
};
use companion_config::CompanionConfig;
use companion_core::{ChatId, CompanionError, Message};
use companion_window::{TiktokenCounter, TokenBudget};

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Continue this conversation instead of the configured one.
    #[arg(long)]
    pub chat_id: Option<String>,

    /// Earlier messages to continue from, one JSON message per line.
    #[arg(long, value_name = "FILE")]
    pub history: Option<PathBuf>,
}

/// Runs the `companion chat` interactive REPL.
pub async fn run_chat(config: &CompanionConfig, args: ChatArgs) -> Result<(), CompanionError> {
    let mut session = build_session(config, &args)?;

    let mut rl = DefaultEditor::new()
        .map_err(|e| CompanionError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "companion chat".bold().green());
    println!("Type {} to exit.\n", "/quit".yellow());
    info!(chat_id = %session.chat_id(), "chat session started");

    let prompt = format!("{}> ", "you".green());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == "/quit" || trimmed == "/exit" {
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                if let Err(e) = handle_chat_line(&mut session, trimmed).await {
                    eprintln!("{}: {e}", "error".red());
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    println!("{}", "goodbye".dimmed());
    Ok(())
}

/// Builds the session, transport, and optional history budget from config.
pub(crate) fn build_session(
    config: &CompanionConfig,
    args: &ChatArgs,
) -> Result<StreamingChatSession, CompanionError> {
    let identity = IdentityContext::from_credential(
        config.chat.access_token.clone().map(SecretString::from),
    );
    let transport = HttpChatTransport::new(config.chat.endpoint.clone(), identity)?;
    debug!(endpoint = transport.endpoint(), "chat transport ready");

    let mut session = StreamingChatSession::new(Arc::new(transport), session_settings(config, args));

    if let Some(path) = &args.history {
        let history = read_history(path)?;
        debug!(messages = history.len(), "loaded chat history");
        session = session.with_history(history);
    }

    if let Some(limit) = config.context.token_limit {
        let catalog = config.model_catalog();
        let model = catalog.get(&config.context.model)?;
        let budget = TokenBudget::new(limit, model)?;
        let counter = Arc::new(TiktokenCounter::new(model)?);
        session = session.with_token_budget(budget, counter)?;
    }

    Ok(session)
}

pub(crate) fn session_settings(config: &CompanionConfig, args: &ChatArgs) -> SessionSettings {
    let chat_id = args
        .chat_id
        .clone()
        .or_else(|| config.chat.chat_id.clone())
        .map(ChatId)
        .unwrap_or_else(ChatId::generate);

    SessionSettings {
        chat_id,
        timezone: config.chat.timezone.clone(),
        extra: config.chat.extra_body.clone(),
        request_timeout: Duration::from_secs(config.chat.request_timeout_secs),
        inactivity_timeout: Duration::from_secs(config.chat.inactivity_timeout_secs),
    }
}

fn read_history(path: &std::path::Path) -> Result<Vec<Message>, CompanionError> {
    companion_dataset::read_jsonl(path)?
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            serde_json::from_value(value).map_err(|e| {
                CompanionError::malformed(format!("{} message {}: {e}", path.display(), i + 1))
            })
        })
        .collect()
}

/// Sends one line and prints the reply while it streams.
async fn handle_chat_line(
    session: &mut StreamingChatSession,
    input: &str,
) -> Result<(), CompanionError> {
    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    // The reply placeholder lands right after the user message.
    let reply_index = session.transcript().len() + 1;
    let done = CancellationToken::new();
    let printer = print_reply(session.subscribe(), reply_index, done.clone());

    let result = session.send(input, &cancel).await;

    interrupt.abort();
    done.cancel();
    let _ = printer.await;

    match result? {
        TurnOutcome::Completed => println!(),
        TurnOutcome::Cancelled => println!("{}", " (interrupted)".dimmed()),
        TurnOutcome::Ignored => {}
    }
    Ok(())
}

/// Prints each new piece of the reply at `reply_index` until `done`.
fn print_reply(
    mut updates: watch::Receiver<Transcript>,
    reply_index: usize,
    done: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut printed = 0;
        loop {
            let finished = tokio::select! {
                changed = updates.changed() => changed.is_err(),
                _ = done.cancelled() => true,
            };
            let fresh = unprinted(&updates.borrow_and_update(), reply_index, printed);
            if !fresh.is_empty() {
                printed += fresh.len();
                print!("{fresh}");
                let _ = std::io::stdout().flush();
            }
            if finished {
                break;
            }
        }
    })
}

/// Reply text past the first `printed` bytes, if the reply exists yet.
fn unprinted(transcript: &Transcript, reply_index: usize, printed: usize) -> String {
    transcript
        .messages()
        .get(reply_index)
        .and_then(|m| m.content.get(printed..))
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(toml: &str) -> CompanionConfig {
        companion_config::load_and_validate_str(toml).unwrap()
    }

    fn args() -> ChatArgs {
        ChatArgs {
            chat_id: None,
            history: None,
        }
    }

    #[test]
    fn settings_come_from_config() {
        let config = config(
            r#"
[chat]
chat_id = "chat-42"
timezone = "Asia/Tokyo"
request_timeout_secs = 12
inactivity_timeout_secs = 34
"#,
        );
        let settings = session_settings(&config, &args());
        assert_eq!(settings.chat_id, ChatId("chat-42".into()));
        assert_eq!(settings.timezone, "Asia/Tokyo");
        assert_eq!(settings.request_timeout, Duration::from_secs(12));
        assert_eq!(settings.inactivity_timeout, Duration::from_secs(34));
    }

    #[test]
    fn chat_id_flag_wins_over_config() {
        let config = config("[chat]\nchat_id = \"from-config\"\n");
        let args = ChatArgs {
            chat_id: Some("from-flag".into()),
            history: None,
        };
        assert_eq!(session_settings(&config, &args).chat_id, ChatId("from-flag".into()));
    }

    #[test]
    fn missing_chat_id_is_generated() {
        let config = config("");
        let a = session_settings(&config, &args()).chat_id;
        let b = session_settings(&config, &args()).chat_id;
        assert_ne!(a, b);
    }

    #[test]
    fn history_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        for message in [Message::user("Earlier"), Message::assistant("Reply")] {
            companion_dataset::append_jsonl(&path, &message).unwrap();
        }
        let args = ChatArgs {
            chat_id: None,
            history: Some(path),
        };

        let session = build_session(&config(""), &args).unwrap();
        let contents: Vec<String> = session
            .transcript()
            .messages()
            .iter()
            .map(|m| m.content.clone())
            .collect();
        assert_eq!(contents, ["Earlier", "Reply"]);
    }

    #[test]
    fn bad_history_names_the_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        std::fs::write(&path, "{\"role\":\"user\"}\n").unwrap();

        let err = read_history(&path).unwrap_err();
        assert!(err.to_string().contains("message 1"), "got: {err}");
    }

    #[test]
    fn unprinted_returns_only_new_text() {
        let transcript = Transcript::from(vec![Message::user("hi"), Message::assistant("Hello")]);
        assert_eq!(unprinted(&transcript, 1, 0), "Hello");
        assert_eq!(unprinted(&transcript, 1, 3), "lo");
        assert_eq!(unprinted(&transcript, 1, 5), "");
        assert_eq!(unprinted(&transcript, 2, 0), "");
    }
}
