// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Companion chat core.
//!
//! This crate provides the error type, the message model, and the
//! collaborator traits (tokenizer, chat transport) shared by the window
//! selector, the streaming chat session, and the dataset tooling.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CompanionError;
pub use traits::{ChatTransport, DeltaStream, TokenCounter};
pub use types::{ChatId, ChatRequest, Message, MessageId, PromptMessage, Role};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn companion_error_has_all_variants() {
        let _config = CompanionError::Configuration("test".into());
        let _malformed = CompanionError::malformed("test");
        let _transport = CompanionError::Transport {
            message: "test".into(),
            status: Some(500),
            source: None,
        };
        let _stream = CompanionError::StreamRead {
            message: "test".into(),
            source: Some(Box::new(std::io::Error::other("reset"))),
        };
        let _timeout = CompanionError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _io = CompanionError::from(std::io::Error::other("test"));
        let _internal = CompanionError::Internal("test".into());
    }

    #[test]
    fn turn_failures_are_distinguished_from_validation_errors() {
        assert!(CompanionError::transport("down").is_turn_failure());
        assert!(
            CompanionError::Timeout {
                duration: std::time::Duration::from_secs(1)
            }
            .is_turn_failure()
        );
        assert!(!CompanionError::Configuration("budget".into()).is_turn_failure());
        assert!(!CompanionError::malformed("shape").is_turn_failure());
    }

    #[test]
    fn transport_status_is_exposed() {
        let err = CompanionError::Transport {
            message: "endpoint returned 500".into(),
            status: Some(500),
            source: None,
        };
        assert_eq!(err.status(), Some(500));
        assert_eq!(CompanionError::transport("offline").status(), None);
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(MessageId::generate(), MessageId::generate());
        assert_ne!(ChatId::generate(), ChatId::generate());
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_token_counter<T: TokenCounter>() {}
        fn _assert_chat_transport<T: ChatTransport>() {}
    }
}
