// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streaming chat session.
//!
//! Each turn goes Idle -> Sending -> Streaming -> Idle. Sending covers the
//! wait for the endpoint to start answering; Streaming covers appending
//! deltas to the assistant placeholder. Any failure drops straight back to
//! Idle with whatever content already arrived left in place.
//!
//! `send` takes `&mut self`, so a session can only ever have one request in
//! flight.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use companion_core::{
    ChatId, ChatRequest, ChatTransport, CompanionError, Message, TokenCounter,
};
use companion_window::TokenBudget;

use crate::transcript::Transcript;

/// States in the session FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No request in flight.
    Idle,
    /// Request sent, waiting for the response stream.
    Sending,
    /// Appending deltas to the assistant placeholder.
    Streaming,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Sending => write!(f, "sending"),
            SessionState::Streaming => write!(f, "streaming"),
        }
    }
}

/// How a call to [`StreamingChatSession::send`] ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The response stream ended normally.
    Completed,
    /// The text was blank; nothing was sent or recorded.
    Ignored,
    /// The caller cancelled; partial content is kept.
    Cancelled,
}

/// Per-session request settings.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub chat_id: ChatId,
    pub timezone: String,
    /// Extra top-level fields merged into every request body.
    pub extra: serde_json::Map<String, serde_json::Value>,
    /// Limit on waiting for the response stream to open.
    pub request_timeout: Duration,
    /// Limit on the gap between two deltas.
    pub inactivity_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            chat_id: ChatId::generate(),
            timezone: "UTC".to_string(),
            extra: serde_json::Map::new(),
            request_timeout: Duration::from_secs(30),
            inactivity_timeout: Duration::from_secs(60),
        }
    }
}

/// Trims outbound history to a token budget.
struct HistoryWindow {
    budget: TokenBudget,
    counter: Arc<dyn TokenCounter>,
}

/// Why a turn stopped.
enum StreamEnd {
    Finished,
    Cancelled,
    Failed(CompanionError),
}

/// One conversation with a streaming chat endpoint.
pub struct StreamingChatSession {
    transport: Arc<dyn ChatTransport>,
    settings: SessionSettings,
    state: watch::Sender<SessionState>,
    transcript: watch::Sender<Transcript>,
    window: Option<HistoryWindow>,
}

impl StreamingChatSession {
    /// Creates an idle session with an empty transcript.
    pub fn new(transport: Arc<dyn ChatTransport>, settings: SessionSettings) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        let (transcript, _) = watch::channel(Transcript::new());
        Self {
            transport,
            settings,
            state,
            transcript,
            window: None,
        }
    }

    /// Seeds the transcript with previously stored messages.
    pub fn with_history(self, history: Vec<Message>) -> Self {
        self.transcript.send_replace(Transcript::from(history));
        self
    }

    /// Sends only the most recent messages that fit `budget` with each turn.
    ///
    /// Fails if `counter` tokenizes for a different model than `budget`.
    pub fn with_token_budget(
        mut self,
        budget: TokenBudget,
        counter: Arc<dyn TokenCounter>,
    ) -> Result<Self, CompanionError> {
        if counter.model() != budget.model() {
            return Err(CompanionError::Configuration(format!(
                "token budget is for {} but the tokenizer is for {}",
                budget.model(),
                counter.model()
            )));
        }
        self.window = Some(HistoryWindow { budget, counter });
        Ok(self)
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// True from the moment a turn is sent until it ends.
    pub fn is_streaming(&self) -> bool {
        self.state() != SessionState::Idle
    }

    /// Receives every state change, for observers on other tasks.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn chat_id(&self) -> &ChatId {
        &self.settings.chat_id
    }

    /// A copy of the transcript as it is right now.
    pub fn transcript(&self) -> Transcript {
        self.transcript.borrow().clone()
    }

    /// Receives a fresh transcript after every change, including each delta.
    pub fn subscribe(&self) -> watch::Receiver<Transcript> {
        self.transcript.subscribe()
    }

    /// Runs one chat turn.
    ///
    /// Blank `text` is ignored. Otherwise the user message and an empty
    /// assistant placeholder are appended, the request is built from the
    /// history up to and including the user message, and deltas are appended
    /// to the placeholder as they arrive. Transport, read, and timeout
    /// failures are returned after the session is back to Idle; partial
    /// content stays in the transcript.
    pub async fn send(
        &mut self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, CompanionError> {
        if text.trim().is_empty() {
            debug!(chat_id = %self.settings.chat_id, "ignoring blank message");
            return Ok(TurnOutcome::Ignored);
        }

        let user = Message::user(text);
        let outbound = self.outbound_history(&user)?;

        let placeholder = self.begin_turn(user);

        let request = ChatRequest {
            messages: outbound,
            chat_id: self.settings.chat_id.clone(),
            timezone: self.settings.timezone.clone(),
            extra: self.settings.extra.clone(),
        };

        self.transition(SessionState::Sending);
        let transport = Arc::clone(&self.transport);
        let request_timeout = self.settings.request_timeout;
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = tokio::time::timeout(request_timeout, transport.open(&request)) => Some(result),
        };

        let mut deltas = match opened {
            None => return self.end_turn(StreamEnd::Cancelled, 0),
            Some(Err(_elapsed)) => {
                let timeout = CompanionError::Timeout {
                    duration: request_timeout,
                };
                return self.end_turn(StreamEnd::Failed(timeout), 0);
            }
            Some(Ok(Err(e))) => return self.end_turn(StreamEnd::Failed(e), 0),
            Some(Ok(Ok(stream))) => stream,
        };

        self.transition(SessionState::Streaming);
        let inactivity = self.settings.inactivity_timeout;
        let mut received = 0usize;
        let end = loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => break StreamEnd::Cancelled,
                next = tokio::time::timeout(inactivity, deltas.next()) => next,
            };
            match next {
                Err(_elapsed) => {
                    break StreamEnd::Failed(CompanionError::Timeout {
                        duration: inactivity,
                    });
                }
                Ok(None) => break StreamEnd::Finished,
                Ok(Some(Err(e))) => break StreamEnd::Failed(e),
                Ok(Some(Ok(delta))) => {
                    received += 1;
                    self.transcript
                        .send_modify(|t| t.append_delta(placeholder, &delta));
                }
            }
        };
        // Releases the connection before reporting.
        drop(deltas);

        self.end_turn(end, received)
    }

    /// History that goes out with this turn: the transcript plus `user`,
    /// trimmed to the token budget if one is set.
    fn outbound_history(&self, user: &Message) -> Result<Vec<Message>, CompanionError> {
        let mut history = self.transcript.borrow().messages().to_vec();
        history.push(user.clone());

        let Some(window) = &self.window else {
            return Ok(history);
        };
        let kept = window
            .budget
            .final_transcript(&history, window.counter.as_ref())?;
        if kept.is_empty() {
            return Err(CompanionError::Configuration(format!(
                "message does not fit the token budget of {}",
                window.budget.limit()
            )));
        }
        if kept.len() < history.len() {
            debug!(
                chat_id = %self.settings.chat_id,
                dropped = history.len() - kept.len(),
                kept = kept.len(),
                token_limit = window.budget.limit(),
                "trimmed history to token budget"
            );
        }
        Ok(kept.to_vec())
    }

    /// Appends the user message and an empty assistant placeholder in one
    /// notification; returns the placeholder's index.
    fn begin_turn(&self, user: Message) -> usize {
        let mut placeholder = 0;
        self.transcript.send_modify(|t| {
            t.push(user);
            placeholder = t.push(Message::assistant(""));
        });
        placeholder
    }

    fn transition(&self, next: SessionState) {
        debug!(
            chat_id = %self.settings.chat_id,
            from = %self.state(),
            to = %next,
            "session state change"
        );
        self.state.send_replace(next);
    }

    fn end_turn(&self, end: StreamEnd, deltas: usize) -> Result<TurnOutcome, CompanionError> {
        self.transition(SessionState::Idle);
        let chars = self
            .transcript
            .borrow()
            .last()
            .map(|m| m.content.chars().count())
            .unwrap_or_default();

        match end {
            StreamEnd::Finished => {
                info!(chat_id = %self.settings.chat_id, deltas, chars, "chat turn completed");
                Ok(TurnOutcome::Completed)
            }
            StreamEnd::Cancelled => {
                info!(chat_id = %self.settings.chat_id, deltas, chars, "chat turn cancelled");
                Ok(TurnOutcome::Cancelled)
            }
            StreamEnd::Failed(error) => {
                warn!(
                    chat_id = %self.settings.chat_id,
                    deltas,
                    chars,
                    error = %error,
                    "chat turn failed"
                );
                Err(error)
            }
        }
    }
}
