// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message model shared by the window selector, chat session, and dataset tooling.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::CompanionError;

/// Unique identifier for a transcript message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the conversation a session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub String);

impl ChatId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Author of a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single transcript entry.
///
/// `content` is empty for an assistant reply that has just started streaming
/// and grows as deltas arrive; it is not touched once the reply is finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    #[serde(rename = "created")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Creates a message stamped with a fresh id and the current time.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// Body of a system, user, or assistant prompt message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextMessage {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Body of a tool result prompt message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolMessage {
    pub content: String,
    pub tool_call_id: String,
}

/// A message in the shape a model tokenizer counts.
///
/// Tagged by `role`. Anything else (extra keys, unknown role, non-string
/// content) is rejected when deserializing, so token counts never include
/// stray fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum PromptMessage {
    System(TextMessage),
    User(TextMessage),
    Assistant(TextMessage),
    Tool(ToolMessage),
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System(TextMessage {
            content: content.into(),
            name: None,
        })
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User(TextMessage {
            content: content.into(),
            name: None,
        })
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant(TextMessage {
            content: content.into(),
            name: None,
        })
    }

    pub fn role(&self) -> Role {
        match self {
            Self::System(_) => Role::System,
            Self::User(_) => Role::User,
            Self::Assistant(_) => Role::Assistant,
            Self::Tool(_) => Role::Tool,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::System(m) | Self::User(m) | Self::Assistant(m) => &m.content,
            Self::Tool(m) => &m.content,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::System(m) | Self::User(m) | Self::Assistant(m) => m.name.as_deref(),
            Self::Tool(_) => None,
        }
    }

    /// Parses one message at a JSON boundary.
    pub fn from_json(value: serde_json::Value) -> Result<Self, CompanionError> {
        serde_json::from_value(value).map_err(|e| CompanionError::malformed(e.to_string()))
    }

    /// Parses a list of messages, reporting the index of the first bad one.
    pub fn parse_all(values: &[serde_json::Value]) -> Result<Vec<Self>, CompanionError> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                serde_json::from_value(v.clone())
                    .map_err(|e| CompanionError::malformed(format!("message {i}: {e}")))
            })
            .collect()
    }
}

impl From<&Message> for PromptMessage {
    fn from(message: &Message) -> Self {
        let text = TextMessage {
            content: message.content.clone(),
            name: None,
        };
        match message.role {
            Role::System => Self::System(text),
            Role::User => Self::User(text),
            Role::Assistant => Self::Assistant(text),
            Role::Tool => Self::Tool(ToolMessage {
                content: message.content.clone(),
                tool_call_id: message.id.0.clone(),
            }),
        }
    }
}

/// JSON body of an outbound chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub chat_id: ChatId,
    pub timezone: String,
    /// Optional extra top-level fields merged into the body.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_display_and_parse() {
        use std::str::FromStr;

        for role in [Role::System, Role::User, Role::Assistant, Role::Tool] {
            let s = role.to_string();
            assert_eq!(Role::from_str(&s).unwrap(), role);
        }
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }

    #[test]
    fn prompt_message_parses_known_shapes() {
        let user = PromptMessage::from_json(json!({"role": "user", "content": "hi"})).unwrap();
        assert_eq!(user, PromptMessage::user("hi"));

        let named = PromptMessage::from_json(
            json!({"role": "assistant", "content": "yo", "name": "Charlotte"}),
        )
        .unwrap();
        assert_eq!(named.name(), Some("Charlotte"));
        assert_eq!(named.role(), Role::Assistant);

        let tool = PromptMessage::from_json(
            json!({"role": "tool", "content": "42", "tool_call_id": "call_1"}),
        )
        .unwrap();
        assert_eq!(tool.role(), Role::Tool);
        assert_eq!(tool.content(), "42");
    }

    #[test]
    fn prompt_message_rejects_extra_fields() {
        let err = PromptMessage::from_json(
            json!({"role": "user", "content": "hi", "created": "2024-01-01"}),
        )
        .unwrap_err();
        assert!(matches!(err, CompanionError::MalformedMessage { .. }));
    }

    #[test]
    fn prompt_message_rejects_unknown_role() {
        let err = PromptMessage::from_json(json!({"role": "narrator", "content": "hi"}))
            .unwrap_err();
        assert!(matches!(err, CompanionError::MalformedMessage { .. }));
    }

    #[test]
    fn prompt_message_rejects_non_string_content() {
        let err = PromptMessage::from_json(json!({"role": "user", "content": 12})).unwrap_err();
        assert!(matches!(err, CompanionError::MalformedMessage { .. }));

        let err = PromptMessage::from_json(json!({"role": "user"})).unwrap_err();
        assert!(matches!(err, CompanionError::MalformedMessage { .. }));
    }

    #[test]
    fn parse_all_names_the_offending_index() {
        let values = vec![
            json!({"role": "user", "content": "a"}),
            json!({"role": "user", "content": "b", "weight": 1}),
        ];
        let err = PromptMessage::parse_all(&values).unwrap_err();
        assert!(err.to_string().contains("message 1"), "got: {err}");
    }

    #[test]
    fn prompt_message_serializes_with_role_tag() {
        let value = serde_json::to_value(PromptMessage::system("be kind")).unwrap();
        assert_eq!(value, json!({"role": "system", "content": "be kind"}));
    }

    #[test]
    fn transcript_message_converts_to_prompt_message() {
        let msg = Message::assistant("hello");
        let prompt = PromptMessage::from(&msg);
        assert_eq!(prompt, PromptMessage::assistant("hello"));
    }

    #[test]
    fn chat_request_flattens_extra_fields() {
        let mut extra = serde_json::Map::new();
        extra.insert("audio_messages_enabled".into(), json!(false));
        let request = ChatRequest {
            messages: vec![],
            chat_id: ChatId("chat-1".into()),
            timezone: "Europe/Berlin".into(),
            extra,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["chat_id"], "chat-1");
        assert_eq!(value["timezone"], "Europe/Berlin");
        assert_eq!(value["audio_messages_enabled"], false);
        assert!(value["messages"].as_array().unwrap().is_empty());
    }

    #[test]
    fn transcript_message_wire_shape() {
        let msg = Message::user("Hello");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "user");
        assert_eq!(value["content"], "Hello");
        assert!(value["created"].is_string());
        assert_eq!(value["id"], msg.id.0);
    }
}
