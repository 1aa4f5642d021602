// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`TokenCounter`] backed by tiktoken BPE encodings.

use std::fmt;

use companion_core::{CompanionError, PromptMessage, TokenCounter};
use tiktoken_rs::CoreBPE;
use tracing::debug;

use crate::models::ModelInfo;

/// Fixed cost of every message's framing.
const TOKENS_PER_MESSAGE: usize = 3;
/// Extra cost when a message carries a `name`.
const TOKENS_PER_NAME: usize = 1;
/// Every reply is primed with `<|start|>assistant<|message|>`.
const REPLY_PRIMER_TOKENS: usize = 3;

/// Counts chat messages the way OpenAI-style chat models bill them.
pub struct TiktokenCounter {
    model: String,
    context_window: usize,
    bpe: CoreBPE,
}

impl TiktokenCounter {
    /// Loads the encoding for `model`. `gpt-4o*` models use `o200k_base`,
    /// everything else `cl100k_base`.
    pub fn new(model: &ModelInfo) -> Result<Self, CompanionError> {
        let encoding = encoding_name(&model.name);
        let bpe = match encoding {
            "o200k_base" => tiktoken_rs::o200k_base(),
            _ => tiktoken_rs::cl100k_base(),
        }
        .map_err(|e| {
            CompanionError::Internal(format!(
                "failed to load {encoding} tokenizer for {}: {e}",
                model.name
            ))
        })?;

        debug!(model = %model.name, encoding, "tokenizer loaded");

        Ok(Self {
            model: model.name.clone(),
            context_window: model.context_window,
            bpe,
        })
    }

    /// Token count of raw text, without message framing.
    pub fn count_text(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    fn count_message(&self, message: &PromptMessage) -> usize {
        let mut tokens = TOKENS_PER_MESSAGE
            + self.count_text(&message.role().to_string())
            + self.count_text(message.content());
        if let Some(name) = message.name() {
            tokens += self.count_text(name) + TOKENS_PER_NAME;
        }
        if let PromptMessage::Tool(tool) = message {
            tokens += self.count_text(&tool.tool_call_id);
        }
        tokens
    }
}

impl TokenCounter for TiktokenCounter {
    fn model(&self) -> &str {
        &self.model
    }

    fn max_context_window(&self) -> usize {
        self.context_window
    }

    fn count_messages(&self, messages: &[PromptMessage]) -> Result<usize, CompanionError> {
        Ok(messages
            .iter()
            .map(|m| self.count_message(m))
            .sum::<usize>()
            + REPLY_PRIMER_TOKENS)
    }
}

impl fmt::Debug for TiktokenCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TiktokenCounter")
            .field("model", &self.model)
            .field("context_window", &self.context_window)
            .finish_non_exhaustive()
    }
}

fn encoding_name(model: &str) -> &'static str {
    if model.starts_with("gpt-4o") {
        "o200k_base"
    } else {
        "cl100k_base"
    }
}
