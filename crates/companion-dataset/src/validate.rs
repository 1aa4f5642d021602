// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Training dataset format checks.
//!
//! Each example is a JSON object with a `messages` list. Problems are
//! counted per [`IssueKind`] across the whole dataset rather than failing on
//! the first one, so a single run reports everything that needs fixing.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use strum::Display;
use tracing::{debug, info, warn};

use companion_core::types::{TextMessage, ToolMessage};
use companion_core::{CompanionError, PromptMessage, TokenCounter};

use crate::profile::FineTuneProfile;

const ALLOWED_KEYS: &[&str] = &["role", "content", "name", "function_call", "weight"];
const ALLOWED_ROLES: &[&str] = &["system", "user", "assistant", "function"];

/// A kind of format problem. Ordered as reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum IssueKind {
    /// The example is not a JSON object.
    DataType,
    MissingMessagesList,
    /// The example has more tokens than the trainer keeps.
    ExampleTooLarge,
    /// A message lacks `role` or `content`.
    MessageMissingKey,
    MissingName,
    MessageUnrecognizedKey,
    UnrecognizedRole,
    /// `content` is absent or not a string.
    MissingContent,
    ExampleMissingAssistantMessage,
}

/// Number of occurrences of each issue kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueCounts(BTreeMap<IssueKind, usize>);

impl IssueCounts {
    fn record(&mut self, kind: IssueKind) {
        *self.0.entry(kind).or_insert(0) += 1;
    }

    pub fn get(&self, kind: IssueKind) -> usize {
        self.0.get(&kind).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (IssueKind, usize)> + '_ {
        self.0.iter().map(|(kind, count)| (*kind, *count))
    }
}

impl fmt::Display for IssueCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("found errors:")?;
        for (kind, count) in self.iter() {
            write!(f, "\n{kind}: {count}")?;
        }
        Ok(())
    }
}

/// Totals for a dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatasetSummary {
    pub examples: usize,
    /// Tokens across all examples whose messages could be counted.
    pub total_tokens: usize,
    pub max_example_tokens: usize,
}

/// Checks every example and returns the summary, or a
/// [`CompanionError::MalformedMessage`] listing each issue kind with its count.
///
/// A dataset smaller than the profile's minimum fails immediately without
/// inspecting any example.
pub fn validate_training_dataset(
    examples: &[Value],
    counter: &dyn TokenCounter,
    profile: &FineTuneProfile,
) -> Result<DatasetSummary, CompanionError> {
    let (summary, issues) = inspect_training_dataset(examples, counter, profile)?;
    if !issues.is_empty() {
        return Err(CompanionError::malformed(issues.to_string()));
    }
    info!(
        examples = summary.examples,
        total_tokens = summary.total_tokens,
        max_example_tokens = summary.max_example_tokens,
        "training dataset is valid"
    );
    Ok(summary)
}

/// Like [`validate_training_dataset`] but returns the issue counts instead
/// of turning them into an error.
pub fn inspect_training_dataset(
    examples: &[Value],
    counter: &dyn TokenCounter,
    profile: &FineTuneProfile,
) -> Result<(DatasetSummary, IssueCounts), CompanionError> {
    profile.check_counter(counter)?;
    if examples.len() < profile.min_examples {
        return Err(CompanionError::malformed(format!(
            "training file has {} example(s), but must have at least {} examples",
            examples.len(),
            profile.min_examples
        )));
    }

    let mut summary = DatasetSummary {
        examples: examples.len(),
        ..DatasetSummary::default()
    };
    let mut issues = IssueCounts::default();

    for (index, example) in examples.iter().enumerate() {
        let Some(object) = example.as_object() else {
            issues.record(IssueKind::DataType);
            continue;
        };
        let Some(messages) = object.get("messages").and_then(Value::as_array) else {
            issues.record(IssueKind::MissingMessagesList);
            continue;
        };

        let tokens = count_example_tokens(messages, counter)?;
        summary.total_tokens += tokens;
        summary.max_example_tokens = summary.max_example_tokens.max(tokens);
        if tokens > profile.max_tokens_per_example {
            debug!(index, tokens, "example exceeds the fine-tuning token limit");
            issues.record(IssueKind::ExampleTooLarge);
        }

        for message in messages {
            check_message(message, profile, &mut issues);
        }

        if !messages.iter().any(|m| role_of(m) == Some("assistant")) {
            issues.record(IssueKind::ExampleMissingAssistantMessage);
        }
    }

    for (kind, count) in issues.iter() {
        warn!(issue = %kind, count, "training dataset issue");
    }
    Ok((summary, issues))
}

fn check_message(message: &Value, profile: &FineTuneProfile, issues: &mut IssueCounts) {
    let Some(fields) = message.as_object() else {
        issues.record(IssueKind::MessageMissingKey);
        return;
    };

    if !fields.contains_key("role") || !fields.contains_key("content") {
        issues.record(IssueKind::MessageMissingKey);
    }

    let role = role_of(message);
    if profile.require_names
        && matches!(role, Some("user" | "assistant"))
        && !fields.get("name").is_some_and(Value::is_string)
    {
        issues.record(IssueKind::MissingName);
    }

    if fields.keys().any(|k| !ALLOWED_KEYS.contains(&k.as_str())) {
        issues.record(IssueKind::MessageUnrecognizedKey);
    }
    if !role.is_some_and(|r| ALLOWED_ROLES.contains(&r)) {
        issues.record(IssueKind::UnrecognizedRole);
    }
    if !fields.get("content").is_some_and(Value::is_string) {
        issues.record(IssueKind::MissingContent);
    }
}

fn role_of(message: &Value) -> Option<&str> {
    message.get("role").and_then(Value::as_str)
}

/// Tokens in one example's messages.
///
/// Counting is lenient: messages with an unknown role are skipped, a missing
/// `content` counts as empty, and `function` messages count as tool results.
pub fn count_example_tokens(
    messages: &[Value],
    counter: &dyn TokenCounter,
) -> Result<usize, CompanionError> {
    let prompts: Vec<PromptMessage> = messages.iter().filter_map(prompt_form).collect();
    counter.count_messages(&prompts)
}

fn prompt_form(message: &Value) -> Option<PromptMessage> {
    let text = |m: &Value| TextMessage {
        content: m
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        name: m.get("name").and_then(Value::as_str).map(str::to_string),
    };
    match role_of(message)? {
        "system" => Some(PromptMessage::System(text(message))),
        "user" => Some(PromptMessage::User(text(message))),
        "assistant" => Some(PromptMessage::Assistant(text(message))),
        "function" => {
            let TextMessage { content, name } = text(message);
            Some(PromptMessage::Tool(ToolMessage {
                content,
                tool_call_id: name.unwrap_or_default(),
            }))
        }
        _ => None,
    }
}
