// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat transport trait for the streaming chat endpoint.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::CompanionError;
use crate::types::ChatRequest;

/// Ordered text deltas of one assistant reply. The stream ends when the
/// reply is complete; there is no terminator item.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String, CompanionError>> + Send>>;

/// Sends one chat turn and hands back the reply as a delta stream.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Issues the request and resolves once the response has started
    /// (headers received, status checked). Non-success statuses are errors.
    async fn open(&self, request: &ChatRequest) -> Result<DeltaStream, CompanionError>;
}
