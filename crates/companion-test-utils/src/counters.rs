// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic token counters.

use std::sync::atomic::{AtomicUsize, Ordering};

use companion_core::{CompanionError, PromptMessage, TokenCounter};

/// Counts each message by a cost declared in its content.
///
/// Content ending in `:<n>` (for example `"user:800"`) costs `n` tokens;
/// anything else costs one token per character. Optional per-message and
/// primer overheads mimic a real tokenizer. Every call to `count_messages`
/// is tallied.
#[derive(Debug)]
pub struct DeclaredTokenCounter {
    model: String,
    context_window: usize,
    per_message: usize,
    primer: usize,
    calls: AtomicUsize,
}

impl DeclaredTokenCounter {
    pub fn new(model: impl Into<String>, context_window: usize) -> Self {
        Self {
            model: model.into(),
            context_window,
            per_message: 0,
            primer: 0,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_overhead(mut self, per_message: usize, primer: usize) -> Self {
        self.per_message = per_message;
        self.primer = primer;
        self
    }

    /// Number of `count_messages` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn declared_cost(content: &str) -> usize {
        content
            .rsplit_once(':')
            .and_then(|(_, n)| n.parse().ok())
            .unwrap_or_else(|| content.chars().count())
    }
}

impl TokenCounter for DeclaredTokenCounter {
    fn model(&self) -> &str {
        &self.model
    }

    fn max_context_window(&self) -> usize {
        self.context_window
    }

    fn count_messages(&self, messages: &[PromptMessage]) -> Result<usize, CompanionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(messages
            .iter()
            .map(|m| self.per_message + Self::declared_cost(m.content()))
            .sum::<usize>()
            + self.primer)
    }
}

/// A counter that always fails, for error propagation tests.
#[derive(Debug)]
pub struct FailingTokenCounter {
    model: String,
    context_window: usize,
}

impl FailingTokenCounter {
    pub fn new(model: impl Into<String>, context_window: usize) -> Self {
        Self {
            model: model.into(),
            context_window,
        }
    }
}

impl TokenCounter for FailingTokenCounter {
    fn model(&self) -> &str {
        &self.model
    }

    fn max_context_window(&self) -> usize {
        self.context_window
    }

    fn count_messages(&self, _messages: &[PromptMessage]) -> Result<usize, CompanionError> {
        Err(CompanionError::malformed("message cannot be tokenized"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_costs_and_fallback() {
        let counter = DeclaredTokenCounter::new("m", 100);
        let messages = [PromptMessage::user("user:800"), PromptMessage::user("hey")];
        assert_eq!(counter.count_messages(&messages).unwrap(), 803);
        assert_eq!(counter.calls(), 1);
    }

    #[test]
    fn overhead_is_added() {
        let counter = DeclaredTokenCounter::new("m", 100).with_overhead(3, 3);
        assert_eq!(counter.count_messages(&[]).unwrap(), 3);
        assert_eq!(
            counter.count_messages(&[PromptMessage::user("x:10")]).unwrap(),
            16
        );
    }

    #[test]
    fn failing_counter_fails() {
        let counter = FailingTokenCounter::new("m", 100);
        assert!(counter.count_messages(&[]).is_err());
        assert_eq!(counter.model(), "m");
    }
}
