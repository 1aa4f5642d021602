// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered conversation history.

use companion_core::Message;

/// Messages in the order they were added. Entries are never removed or
/// reordered; only the streaming assistant entry's content grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Appends a message and returns its index.
    pub(crate) fn push(&mut self, message: Message) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }

    /// Appends `delta` to the content of the message at `index`.
    pub(crate) fn append_delta(&mut self, index: usize, delta: &str) {
        if let Some(message) = self.messages.get_mut(index) {
            message.content.push_str(delta);
        }
    }
}

impl From<Vec<Message>> for Transcript {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_returns_index_and_deltas_append() {
        let mut transcript = Transcript::new();
        assert_eq!(transcript.push(Message::user("Hello")), 0);
        let reply = transcript.push(Message::assistant(""));
        transcript.append_delta(reply, "Hi");
        transcript.append_delta(reply, " there");
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.last().unwrap().content, "Hi there");
    }

    #[test]
    fn out_of_range_delta_is_ignored() {
        let mut transcript = Transcript::new();
        transcript.append_delta(3, "lost");
        assert!(transcript.is_empty());
    }
}
