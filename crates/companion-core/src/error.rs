// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Companion chat core.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across the window selector, chat session,
/// transports, and dataset tooling.
#[derive(Debug, Error)]
pub enum CompanionError {
    /// A token budget or model setting is invalid (budget above the model's
    /// context window, unknown model, unusable header value).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A message does not have the recognized shape (unknown role, extra or
    /// missing fields, non-string content).
    #[error("malformed message: {message}")]
    MalformedMessage { message: String },

    /// Network failure or non-success status from the chat endpoint.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        /// HTTP status, when the endpoint answered at all.
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The response body terminated abnormally mid-read.
    #[error("stream read error: {message}")]
    StreamRead {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Filesystem errors from dataset IO.
    #[error("io error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CompanionError {
    /// Shorthand for a [`CompanionError::MalformedMessage`].
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedMessage {
            message: message.into(),
        }
    }

    /// Shorthand for a [`CompanionError::Transport`] without status or source.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// HTTP status carried by a transport error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// True for failures that end a chat turn at runtime (as opposed to
    /// validation errors raised before any work starts).
    pub fn is_turn_failure(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::StreamRead { .. } | Self::Timeout { .. }
        )
    }
}
