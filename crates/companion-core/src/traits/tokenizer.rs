// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tokenizer collaborator trait.

use crate::error::CompanionError;
use crate::types::PromptMessage;

/// Counts model tokens for a sequence of prompt messages.
///
/// Implementations must be deterministic and monotonic: counting a longer
/// contiguous slice never yields a smaller number. Window selection relies on
/// this to binary search.
pub trait TokenCounter: Send + Sync {
    /// Model identifier this counter tokenizes for.
    fn model(&self) -> &str;

    /// Maximum context window of the model, in tokens.
    fn max_context_window(&self) -> usize;

    /// Total tokens consumed by `messages`, including per-message and
    /// reply-primer overhead.
    fn count_messages(&self, messages: &[PromptMessage]) -> Result<usize, CompanionError>;
}

impl<T: TokenCounter + ?Sized> TokenCounter for &T {
    fn model(&self) -> &str {
        (**self).model()
    }

    fn max_context_window(&self) -> usize {
        (**self).max_context_window()
    }

    fn count_messages(&self, messages: &[PromptMessage]) -> Result<usize, CompanionError> {
        (**self).count_messages(messages)
    }
}
