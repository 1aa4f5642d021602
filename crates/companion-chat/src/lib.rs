// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streaming chat for the Companion chat core.
//!
//! [`StreamingChatSession`] records a user message, opens a response stream
//! through a [`ChatTransport`](companion_core::ChatTransport), and grows the
//! assistant reply delta by delta. [`HttpChatTransport`] is the production
//! transport; [`IdentityContext`] supplies its credential.

pub mod decode;
pub mod http;
pub mod identity;
pub mod session;
pub mod transcript;

pub use decode::Utf8ChunkDecoder;
pub use http::HttpChatTransport;
pub use identity::{Credential, CredentialSubscription, IdentityContext};
pub use session::{SessionSettings, SessionState, StreamingChatSession, TurnOutcome};
pub use transcript::Transcript;
