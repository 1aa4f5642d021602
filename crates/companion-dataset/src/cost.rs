// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fine-tuning cost estimate.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use companion_core::{CompanionError, TokenCounter};

use crate::profile::FineTuneProfile;
use crate::validate::count_example_tokens;

const TARGET_EPOCHS: usize = 3;
const MIN_TARGET_EXAMPLES: usize = 100;
const MAX_TARGET_EXAMPLES: usize = 25_000;
const MIN_DEFAULT_EPOCHS: usize = 1;
const MAX_DEFAULT_EPOCHS: usize = 25;

/// Expected training cost in USD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostEstimate {
    pub epochs: usize,
    /// Tokens in one pass over the dataset.
    pub tokens: usize,
    pub cost: f64,
}

/// Epochs the trainer picks by default for a dataset of `examples`.
///
/// Aims for three epochs, raised for small datasets and lowered for large
/// ones so that examples × epochs lands between 100 and 25,000.
pub fn training_epochs(examples: usize) -> usize {
    if examples == 0 {
        return MAX_DEFAULT_EPOCHS;
    }
    if examples * TARGET_EPOCHS < MIN_TARGET_EXAMPLES {
        MAX_DEFAULT_EPOCHS.min(MIN_TARGET_EXAMPLES / examples)
    } else if examples * TARGET_EPOCHS > MAX_TARGET_EXAMPLES {
        MIN_DEFAULT_EPOCHS.max(MAX_TARGET_EXAMPLES / examples)
    } else {
        TARGET_EPOCHS
    }
}

/// Estimates the cost of fine-tuning on `examples`.
///
/// Examples without a `messages` list contribute no tokens.
pub fn estimate_training_cost(
    examples: &[Value],
    counter: &dyn TokenCounter,
    profile: &FineTuneProfile,
) -> Result<CostEstimate, CompanionError> {
    profile.check_counter(counter)?;

    let mut tokens = 0;
    for example in examples {
        if let Some(messages) = example.get("messages").and_then(Value::as_array) {
            tokens += count_example_tokens(messages, counter)?;
        }
    }

    let epochs = training_epochs(examples.len());
    let cost = profile.base_cost_per_million_tokens / 1e6 * tokens as f64 * epochs as f64;
    debug!(
        model = %profile.model,
        examples = examples.len(),
        tokens,
        epochs,
        cost,
        "estimated training cost"
    );
    Ok(CostEstimate {
        epochs,
        tokens,
        cost,
    })
}
