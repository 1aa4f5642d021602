// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted chat transport for deterministic session tests.
//!
//! `MockTransport` implements `ChatTransport` with a FIFO queue of turns,
//! records every request it receives, and counts reply streams that have
//! been dropped.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::Stream;
use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;

use companion_core::{ChatRequest, ChatTransport, CompanionError, DeltaStream};

/// What the transport does for one call to `open`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockTurn {
    /// Stream the deltas, then end normally.
    Reply(Vec<String>),
    /// Fail to open with a non-success status.
    Reject { status: u16, body: String },
    /// Fail to open without any status (connection refused and the like).
    Unreachable(String),
    /// Stream the deltas, then fail mid-read.
    BreakAfter { deltas: Vec<String>, message: String },
    /// Stream the deltas, then never produce another chunk.
    Stall(Vec<String>),
    /// Never return from `open`.
    Hang,
}

impl MockTurn {
    /// Convenience for a reply built from string slices.
    pub fn reply(deltas: &[&str]) -> Self {
        Self::Reply(deltas.iter().map(|d| d.to_string()).collect())
    }
}

/// A mock chat endpoint that plays back queued turns.
///
/// When the queue is empty, a single "mock response" delta is streamed.
#[derive(Clone)]
pub struct MockTransport {
    turns: Arc<Mutex<VecDeque<MockTurn>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
    released: Arc<AtomicUsize>,
}

impl MockTransport {
    /// Create a new mock transport with an empty turn queue.
    pub fn new() -> Self {
        Self {
            turns: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a mock transport pre-loaded with the given turns.
    pub fn with_turns(turns: Vec<MockTurn>) -> Self {
        Self {
            turns: Arc::new(Mutex::new(VecDeque::from(turns))),
            requests: Arc::new(Mutex::new(Vec::new())),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Add a turn to the end of the queue.
    pub async fn push_turn(&self, turn: MockTurn) {
        self.turns.lock().await.push_back(turn);
    }

    /// Every request received so far, in order.
    pub async fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of reply streams dropped so far.
    pub fn streams_released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    fn track(&self, inner: DeltaStream) -> DeltaStream {
        Box::pin(TrackedStream {
            inner,
            released: Arc::clone(&self.released),
        })
    }

    async fn next_turn(&self) -> MockTurn {
        self.turns
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| MockTurn::reply(&["mock response"]))
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn open(&self, request: &ChatRequest) -> Result<DeltaStream, CompanionError> {
        self.requests.lock().await.push(request.clone());

        let stream: DeltaStream = match self.next_turn().await {
            MockTurn::Reply(deltas) => Box::pin(stream::iter(deltas.into_iter().map(Ok))),
            MockTurn::Reject { status, body } => {
                return Err(CompanionError::Transport {
                    message: format!("chat endpoint returned {status}: {body}"),
                    status: Some(status),
                    source: None,
                });
            }
            MockTurn::Unreachable(message) => return Err(CompanionError::transport(message)),
            MockTurn::BreakAfter { deltas, message } => {
                let failure = stream::once(async move {
                    Err(CompanionError::StreamRead {
                        message,
                        source: None,
                    })
                });
                Box::pin(stream::iter(deltas.into_iter().map(Ok)).chain(failure))
            }
            MockTurn::Stall(deltas) => {
                Box::pin(stream::iter(deltas.into_iter().map(Ok)).chain(stream::pending()))
            }
            MockTurn::Hang => {
                return std::future::pending::<Result<DeltaStream, CompanionError>>().await;
            }
        };
        Ok(self.track(stream))
    }
}

/// Counts itself as released when dropped.
struct TrackedStream {
    inner: DeltaStream,
    released: Arc<AtomicUsize>,
}

impl Stream for TrackedStream {
    type Item = Result<String, CompanionError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl Drop for TrackedStream {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}
