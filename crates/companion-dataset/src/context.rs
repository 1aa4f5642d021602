// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation context around one target message.

use companion_core::{CompanionError, PromptMessage, TokenCounter};
use companion_window::TokenBudget;

/// A target message with the nearby messages that fit the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextWindow<'a> {
    /// Latest messages before the target.
    pub before: &'a [PromptMessage],
    pub target: &'a PromptMessage,
    /// Earliest messages after the target.
    pub after: &'a [PromptMessage],
}

/// Selects the longest run before `index` and the longest run after it
/// that each fit `budget` on their own. The target itself is not counted.
pub fn context_around<'a>(
    messages: &'a [PromptMessage],
    index: usize,
    budget: &TokenBudget,
    counter: &dyn TokenCounter,
) -> Result<ContextWindow<'a>, CompanionError> {
    let Some(target) = messages.get(index) else {
        return Err(CompanionError::Configuration(format!(
            "message index {index} is out of range for {} messages",
            messages.len()
        )));
    };
    let before = budget.final_messages(&messages[..index], counter)?;
    let after = budget.initial_messages(&messages[index + 1..], counter)?;
    Ok(ContextWindow {
        before,
        target,
        after,
    })
}
