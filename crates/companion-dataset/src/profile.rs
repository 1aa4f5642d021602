// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fine-tuning limits and pricing per model.
//!
//! Prices are USD per million training tokens.
//!
//! gpt-4o-mini-2024-07-18: $0.90/MTok, 65,536 tokens per example.

use companion_core::{CompanionError, TokenCounter};

/// Trainer limits and price for one fine-tunable model.
#[derive(Debug, Clone, PartialEq)]
pub struct FineTuneProfile {
    pub model: String,
    pub base_cost_per_million_tokens: f64,
    /// Examples above this are truncated by the trainer.
    pub max_tokens_per_example: usize,
    /// Smallest dataset the trainer accepts.
    pub min_examples: usize,
    /// Report user and assistant messages without a `name`.
    pub require_names: bool,
}

impl FineTuneProfile {
    /// Profile for a model with known training info.
    pub fn builtin(model: &str) -> Result<Self, CompanionError> {
        match model {
            "gpt-4o-mini-2024-07-18" => Ok(Self {
                model: model.to_string(),
                base_cost_per_million_tokens: 0.9,
                max_tokens_per_example: 65_536,
                min_examples: 10,
                require_names: false,
            }),
            other => Err(CompanionError::Configuration(format!(
                "model \"{other}\" training info unknown"
            ))),
        }
    }

    /// Fails unless the counter tokenizes for this profile's model.
    pub(crate) fn check_counter(&self, counter: &dyn TokenCounter) -> Result<(), CompanionError> {
        if counter.model() != self.model {
            return Err(CompanionError::Configuration(format!(
                "fine-tune profile for {} used with a {} tokenizer",
                self.model,
                counter.model()
            )));
        }
        Ok(())
    }
}
