// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP chat transport.
//!
//! POSTs the [`ChatRequest`] as JSON with a bearer credential taken from the
//! [`IdentityContext`] and exposes the chunked `text/*` response body as a
//! stream of text deltas. No framing is assumed between chunks.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use secrecy::ExposeSecret;
use tracing::{debug, warn};

use companion_core::{ChatRequest, ChatTransport, CompanionError, DeltaStream};

use crate::decode::Utf8ChunkDecoder;
use crate::identity::IdentityContext;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Streams replies from a chat endpoint over HTTP.
#[derive(Debug, Clone)]
pub struct HttpChatTransport {
    client: reqwest::Client,
    endpoint: String,
    identity: IdentityContext,
}

impl HttpChatTransport {
    pub fn new(
        endpoint: impl Into<String>,
        identity: IdentityContext,
    ) -> Result<Self, CompanionError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| CompanionError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            identity,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn open(&self, request: &ChatRequest) -> Result<DeltaStream, CompanionError> {
        let credential = self.identity.current().ok_or_else(|| {
            CompanionError::transport("not signed in: no credential for the chat endpoint")
        })?;

        debug!(
            endpoint = %self.endpoint,
            chat_id = %request.chat_id,
            messages = request.messages.len(),
            "sending chat request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credential.expose_secret())
            .header(ACCEPT, "text/plain")
            .json(request)
            .send()
            .await
            .map_err(|e| CompanionError::Transport {
                message: format!("HTTP request failed: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, "chat response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "chat endpoint rejected request");
            return Err(CompanionError::Transport {
                message: format!("chat endpoint returned {status}: {body}"),
                status: Some(status.as_u16()),
                source: None,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with("text/") {
            return Err(CompanionError::Transport {
                message: format!("expected a text response, got content type `{content_type}`"),
                status: Some(status.as_u16()),
                source: None,
            });
        }

        Ok(text_deltas(Box::pin(response.bytes_stream())))
    }
}

struct BodyState<S> {
    body: S,
    decoder: Utf8ChunkDecoder,
    failure: Option<CompanionError>,
    done: bool,
}

/// Decodes a byte stream into non-empty text deltas. A read error is
/// yielded once as [`CompanionError::StreamRead`] and ends the stream,
/// after any bytes still held by the decoder are flushed.
pub(crate) fn text_deltas<S, B, E>(body: S) -> DeltaStream
where
    S: Stream<Item = Result<B, E>> + Unpin + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let state = BodyState {
        body,
        decoder: Utf8ChunkDecoder::new(),
        failure: None,
        done: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        if let Some(error) = state.failure.take() {
            return Some((Err(error), state));
        }
        while !state.done {
            match state.body.next().await {
                Some(Ok(chunk)) => {
                    let text = state.decoder.decode(chunk.as_ref());
                    if !text.is_empty() {
                        return Some((Ok(text), state));
                    }
                }
                Some(Err(e)) => {
                    state.done = true;
                    let error = CompanionError::StreamRead {
                        message: format!("failed to read response body: {e}"),
                        source: Some(Box::new(e)),
                    };
                    let held = if state.decoder.has_pending() {
                        state.decoder.finish()
                    } else {
                        None
                    };
                    return match held {
                        Some(rest) => {
                            state.failure = Some(error);
                            Some((Ok(rest), state))
                        }
                        None => Some((Err(error), state)),
                    };
                }
                None => {
                    state.done = true;
                    let rest = state.decoder.finish();
                    return rest.map(|text| (Ok(text), state));
                }
            }
        }
        None
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use companion_core::{ChatId, Message};
    use secrecy::SecretString;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn signed_in() -> IdentityContext {
        IdentityContext::from_credential(Some(SecretString::from("test-token")))
    }

    fn request() -> ChatRequest {
        ChatRequest {
            messages: vec![Message::user("Hello")],
            chat_id: ChatId("chat-1".into()),
            timezone: "Europe/London".into(),
            extra: Default::default(),
        }
    }

    async fn collect(stream: DeltaStream) -> Result<String, CompanionError> {
        let parts: Vec<Result<String, CompanionError>> = stream.collect().await;
        parts.into_iter().collect()
    }

    #[tokio::test]
    async fn streams_text_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_partial_json(serde_json::json!({
                "chat_id": "chat-1",
                "timezone": "Europe/London",
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/plain; charset=utf-8")
                    .set_body_string("Hi there"),
            )
            .mount(&server)
            .await;

        let transport =
            HttpChatTransport::new(format!("{}/chat", server.uri()), signed_in()).unwrap();
        let stream = transport.open(&request()).await.unwrap();
        assert_eq!(collect(stream).await.unwrap(), "Hi there");
    }

    #[tokio::test]
    async fn non_success_status_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let transport = HttpChatTransport::new(server.uri(), signed_in()).unwrap();
        let err = transport.open(&request()).await.err().unwrap();
        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().contains("boom"), "got: {err}");
    }

    #[tokio::test]
    async fn json_response_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"audio": "..."})),
            )
            .mount(&server)
            .await;

        let transport = HttpChatTransport::new(server.uri(), signed_in()).unwrap();
        let err = transport.open(&request()).await.err().unwrap();
        assert!(matches!(err, CompanionError::Transport { .. }));
        assert!(err.to_string().contains("application/json"), "got: {err}");
    }

    #[tokio::test]
    async fn missing_credential_fails_before_sending() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let transport = HttpChatTransport::new(server.uri(), IdentityContext::new()).unwrap();
        let err = transport.open(&request()).await.err().unwrap();
        assert!(matches!(err, CompanionError::Transport { status: None, .. }));
    }

    #[tokio::test]
    async fn credential_changes_apply_to_next_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer rotated"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/plain")
                    .set_body_string("ok"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let identity = signed_in();
        let transport = HttpChatTransport::new(server.uri(), identity.clone()).unwrap();
        identity.set(Some(SecretString::from("rotated")));
        let stream = transport.open(&request()).await.unwrap();
        assert_eq!(collect(stream).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        // Port 9 (discard) on localhost is almost never listening.
        let transport = HttpChatTransport::new("http://127.0.0.1:9/chat", signed_in()).unwrap();
        let err = transport.open(&request()).await.err().unwrap();
        assert!(matches!(err, CompanionError::Transport { status: None, .. }));
    }

    #[tokio::test]
    async fn split_code_points_and_read_errors() {
        let bytes = "día ☕".as_bytes().to_vec();
        let chunks: Vec<Result<Vec<u8>, std::io::Error>> = vec![
            Ok(bytes[..2].to_vec()),
            Ok(bytes[2..6].to_vec()),
            Ok(bytes[6..].to_vec()),
            Err(std::io::Error::other("connection reset")),
        ];
        let mut deltas = text_deltas(stream::iter(chunks));

        let mut text = String::new();
        let mut failure = None;
        while let Some(item) = deltas.next().await {
            match item {
                Ok(delta) => text.push_str(&delta),
                Err(e) => failure = Some(e),
            }
        }
        assert_eq!(text, "día ☕");
        assert!(matches!(failure, Some(CompanionError::StreamRead { .. })));
    }

    #[tokio::test]
    async fn read_error_flushes_held_bytes_before_failing() {
        let bytes = "ok ☕".as_bytes().to_vec();
        let chunks: Vec<Result<Vec<u8>, std::io::Error>> = vec![
            Ok(bytes[..4].to_vec()),
            Err(std::io::Error::other("connection reset")),
        ];
        let items: Vec<Result<String, CompanionError>> =
            text_deltas(stream::iter(chunks)).collect().await;

        assert_eq!(items.len(), 3, "got: {items:?}");
        assert_eq!(items[0].as_deref().unwrap(), "ok ");
        assert_eq!(items[1].as_deref().unwrap(), "\u{FFFD}");
        assert!(matches!(items[2], Err(CompanionError::StreamRead { .. })));
    }
}
