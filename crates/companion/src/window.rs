// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `companion window` command implementation.

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use tracing::info;

use companion_config::CompanionConfig;
use companion_core::{CompanionError, PromptMessage, TokenCounter};
use companion_window::{TiktokenCounter, TokenBudget};

/// Which end of the conversation to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Side {
    /// Most recent messages.
    End,
    /// Earliest messages.
    Start,
}

#[derive(Args, Debug)]
pub struct WindowArgs {
    /// JSON array of messages with `role` and `content`.
    pub file: PathBuf,

    /// Token limit; defaults to the model's whole context window.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Model to count tokens for; defaults to `context.model`.
    #[arg(long)]
    pub model: Option<String>,

    #[arg(long, value_enum, default_value_t = Side::End)]
    pub from: Side,
}

/// Prints the kept messages as JSON on stdout and a summary on stderr.
pub fn run_window(config: &CompanionConfig, args: &WindowArgs) -> Result<(), CompanionError> {
    let messages = read_conversation(&args.file)?;

    let catalog = config.model_catalog();
    let model = catalog.get(args.model.as_deref().unwrap_or(&config.context.model))?;
    let counter = TiktokenCounter::new(model)?;
    let limit = args
        .limit
        .or(config.context.token_limit)
        .unwrap_or(model.context_window);
    let budget = TokenBudget::new(limit, model)?;

    let kept = select_window(&messages, &budget, &counter, args.from)?;
    let tokens = window_tokens(kept, &counter)?;
    info!(
        model = %model.name,
        total = messages.len(),
        kept = kept.len(),
        tokens,
        "selected window"
    );

    let json = serde_json::to_string_pretty(kept)
        .map_err(|e| CompanionError::Internal(format!("failed to serialize messages: {e}")))?;
    println!("{json}");
    eprintln!(
        "kept {} of {} messages ({tokens} of {limit} tokens)",
        kept.len(),
        messages.len()
    );
    Ok(())
}

pub(crate) fn select_window<'a>(
    messages: &'a [PromptMessage],
    budget: &TokenBudget,
    counter: &dyn TokenCounter,
    from: Side,
) -> Result<&'a [PromptMessage], CompanionError> {
    match from {
        Side::End => budget.final_messages(messages, counter),
        Side::Start => budget.initial_messages(messages, counter),
    }
}

fn read_conversation(path: &Path) -> Result<Vec<PromptMessage>, CompanionError> {
    let text = std::fs::read_to_string(path)?;
    let values: Vec<serde_json::Value> = serde_json::from_str(&text).map_err(|e| {
        CompanionError::malformed(format!("{}: expected a JSON array: {e}", path.display()))
    })?;
    PromptMessage::parse_all(&values)
}

/// Tokens the kept window costs. An empty window sends nothing, so no reply
/// primer is counted.
fn window_tokens(
    kept: &[PromptMessage],
    counter: &dyn TokenCounter,
) -> Result<usize, CompanionError> {
    if kept.is_empty() {
        return Ok(0);
    }
    counter.count_messages(kept)
}
