// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits the core depends on but does not implement itself.
//!
//! The tokenizer and the chat transport are injected so the selector and the
//! session can be exercised with deterministic test doubles.

pub mod tokenizer;
pub mod transport;

pub use tokenizer::TokenCounter;
pub use transport::{ChatTransport, DeltaStream};
