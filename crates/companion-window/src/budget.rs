// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A validated token limit bound to one model.

use companion_core::{CompanionError, Message, PromptMessage, TokenCounter};

use crate::models::ModelInfo;
use crate::selector::{select_final_messages_by_token_limit, select_initial_messages_by_token_limit};

/// Token limit checked against a model's context window at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBudget {
    limit: usize,
    model: String,
    max_context_window: usize,
}

impl TokenBudget {
    /// Fails with [`CompanionError::Configuration`] if `limit` is larger
    /// than the model's context window.
    pub fn new(limit: usize, model: &ModelInfo) -> Result<Self, CompanionError> {
        if limit > model.context_window {
            return Err(CompanionError::Configuration(format!(
                "token limit {limit} exceeds the context window of {} ({})",
                model.name, model.context_window
            )));
        }
        Ok(Self {
            limit,
            model: model.name.clone(),
            max_context_window: model.context_window,
        })
    }

    /// Uses the counter's whole context window as the limit.
    pub fn full_window(counter: &dyn TokenCounter) -> Self {
        Self {
            limit: counter.max_context_window(),
            model: counter.model().to_string(),
            max_context_window: counter.max_context_window(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_context_window(&self) -> usize {
        self.max_context_window
    }

    /// Most recent messages that fit.
    pub fn final_messages<'a>(
        &self,
        messages: &'a [PromptMessage],
        counter: &dyn TokenCounter,
    ) -> Result<&'a [PromptMessage], CompanionError> {
        self.check_counter(counter)?;
        select_final_messages_by_token_limit(
            messages,
            self.limit,
            |slice| counter.count_messages(slice),
            self.max_context_window,
        )
    }

    /// Earliest messages that fit.
    pub fn initial_messages<'a>(
        &self,
        messages: &'a [PromptMessage],
        counter: &dyn TokenCounter,
    ) -> Result<&'a [PromptMessage], CompanionError> {
        self.check_counter(counter)?;
        select_initial_messages_by_token_limit(
            messages,
            self.limit,
            |slice| counter.count_messages(slice),
            self.max_context_window,
        )
    }

    /// Most recent transcript messages that fit, counted in prompt form.
    pub fn final_transcript<'a>(
        &self,
        messages: &'a [Message],
        counter: &dyn TokenCounter,
    ) -> Result<&'a [Message], CompanionError> {
        let prompts: Vec<PromptMessage> = messages.iter().map(PromptMessage::from).collect();
        let kept = self.final_messages(&prompts, counter)?.len();
        Ok(&messages[messages.len() - kept..])
    }

    fn check_counter(&self, counter: &dyn TokenCounter) -> Result<(), CompanionError> {
        if counter.model() != self.model {
            return Err(CompanionError::Configuration(format!(
                "budget for {} used with a {} tokenizer",
                self.model,
                counter.model()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use companion_test_utils::DeclaredTokenCounter;

    fn pi() -> ModelInfo {
        ModelInfo::new("inflection_3_pi", 8_000)
    }

    #[test]
    fn rejects_limit_above_window() {
        let err = TokenBudget::new(8_001, &pi()).unwrap_err();
        assert!(matches!(err, CompanionError::Configuration(_)));
        assert!(TokenBudget::new(8_000, &pi()).is_ok());
    }

    #[test]
    fn final_messages_uses_counter() {
        let counter = DeclaredTokenCounter::new("inflection_3_pi", 8_000);
        let messages = vec![
            PromptMessage::system("system:500"),
            PromptMessage::user("user:800"),
            PromptMessage::assistant("assistant:700"),
            PromptMessage::user("user:400"),
        ];
        let budget = TokenBudget::new(1_300, &pi()).unwrap();
        let kept = budget.final_messages(&messages, &counter).unwrap();
        assert_eq!(kept, &messages[2..]);

        let kept = budget.initial_messages(&messages, &counter).unwrap();
        assert_eq!(kept, &messages[..1]);
    }

    #[test]
    fn final_transcript_returns_matching_suffix() {
        let counter = DeclaredTokenCounter::new("inflection_3_pi", 8_000);
        let transcript = vec![
            Message::user("a:10"),
            Message::assistant("b:10"),
            Message::user("c:10"),
        ];
        let budget = TokenBudget::new(25, &pi()).unwrap();
        let kept = budget.final_transcript(&transcript, &counter).unwrap();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].id, transcript[1].id);
    }

    #[test]
    fn mismatched_tokenizer_is_rejected() {
        let counter = DeclaredTokenCounter::new("gpt-4o-mini-2024-07-18", 128_000);
        let budget = TokenBudget::new(100, &pi()).unwrap();
        let err = budget.final_messages(&[], &counter).unwrap_err();
        assert!(matches!(err, CompanionError::Configuration(_)));
    }

    #[test]
    fn full_window_takes_counter_limits() {
        let counter = DeclaredTokenCounter::new("inflection_3_pi", 8_000);
        let budget = TokenBudget::full_window(&counter);
        assert_eq!(budget.limit(), 8_000);
        assert_eq!(budget.model(), "inflection_3_pi");
        assert_eq!(budget.max_context_window(), 8_000);
    }
}
