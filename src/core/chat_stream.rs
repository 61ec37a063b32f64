//! Streaming completion client.
//!
//! Sends an assembled request to the `streamGenerateContent` endpoint
//! (SSE framing) and forwards text fragments over an unbounded channel.
//! Each spawned stream is tagged with an id so the consumer can drop
//! fragments from superseded streams. Failures arrive as one typed
//! [`ChatError`] followed by `End`; classification happens here, from the
//! HTTP status code, never by sniffing message text downstream.

use futures_util::StreamExt;
use memchr::memchr;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::api::{ApiErrorEnvelope, GenerateContentChunk, GenerateContentRequest};
use crate::core::error::ChatError;
use crate::utils::url::construct_stream_url;

/// Bound on how long one submission may stay in flight. The source
/// behavior had no timeout at all; this is the explicit contract.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Clone, Debug)]
pub enum StreamMessage {
    Chunk(String),
    Error(ChatError),
    End,
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

fn handle_data_payload(
    payload: &str,
    model: &str,
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
) -> bool {
    // An error envelope mid-stream would still deserialize as a chunk
    // with no candidates, so check for it before the chunk shape. The
    // envelope carries the HTTP status, so an in-band 429 classifies the
    // same way a rejected request does.
    if let Ok(envelope) = serde_json::from_str::<ApiErrorEnvelope>(payload) {
        let detail = error_detail(payload);
        let error = match envelope.error.code {
            Some(code) => ChatError::from_status(code, model, detail),
            None => ChatError::StreamFailure { detail },
        };
        let _ = tx.send((StreamMessage::Error(error), stream_id));
        let _ = tx.send((StreamMessage::End, stream_id));
        return true;
    }

    match serde_json::from_str::<GenerateContentChunk>(payload) {
        Ok(chunk) => {
            if let Some(text) = chunk.text_delta() {
                let _ = tx.send((StreamMessage::Chunk(text), stream_id));
            }
            false
        }
        Err(_) => {
            if payload.trim().is_empty() {
                return false;
            }

            let detail = error_detail(payload);
            let _ = tx.send((
                StreamMessage::Error(ChatError::StreamFailure { detail }),
                stream_id,
            ));
            let _ = tx.send((StreamMessage::End, stream_id));
            true
        }
    }
}

fn process_sse_line(
    line: &str,
    model: &str,
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
) -> bool {
    extract_data_payload(line)
        .map(|payload| handle_data_payload(payload, model, tx, stream_id))
        .unwrap_or(false)
}

/// Pull a human-readable summary out of an error body, falling back to
/// the collapsed raw text.
fn error_detail(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ApiErrorEnvelope>(body) {
        if let Some(message) = envelope.error.message {
            let collapsed = message.split_whitespace().collect::<Vec<_>>().join(" ");
            if !collapsed.is_empty() {
                return collapsed;
            }
        }
    }
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        "<empty response body>".to_string()
    } else {
        collapsed
    }
}

pub struct StreamParams {
    pub client: reqwest::Client,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub request: GenerateContentRequest,
    pub cancel_token: tokio_util::sync::CancellationToken,
    pub stream_id: u64,
}

#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(&self, params: StreamParams) {
        let tx_clone = self.tx.clone();
        tokio::spawn(async move {
            let StreamParams {
                client,
                base_url,
                api_key,
                model,
                request,
                cancel_token,
                stream_id,
            } = params;

            let send_error = |error: ChatError| {
                let _ = tx_clone.send((StreamMessage::Error(error), stream_id));
                let _ = tx_clone.send((StreamMessage::End, stream_id));
            };

            let stream_body = async {
                let stream_url = construct_stream_url(&base_url, &model);
                debug!(model = %model, stream_id, "starting completion stream");

                let response = client
                    .post(stream_url)
                    .header("Content-Type", "application/json")
                    .header("x-goog-api-key", &api_key)
                    .json(&request)
                    .send()
                    .await;

                match response {
                    Ok(response) => {
                        let status = response.status();
                        if !status.is_success() {
                            let body = response
                                .text()
                                .await
                                .unwrap_or_else(|_| "<no body>".to_string());
                            warn!(status = status.as_u16(), stream_id, "backend rejected request");
                            send_error(ChatError::from_status(
                                status.as_u16(),
                                &model,
                                error_detail(&body),
                            ));
                            return;
                        }

                        let mut stream = response.bytes_stream();
                        let mut buffer: Vec<u8> = Vec::new();

                        while let Some(chunk) = stream.next().await {
                            if cancel_token.is_cancelled() {
                                send_error(ChatError::StreamFailure {
                                    detail: "cancelled by user".to_string(),
                                });
                                return;
                            }

                            match chunk {
                                Ok(chunk_bytes) => {
                                    buffer.extend_from_slice(&chunk_bytes);

                                    while let Some(newline_pos) = memchr(b'\n', &buffer) {
                                        let line_str =
                                            match std::str::from_utf8(&buffer[..newline_pos]) {
                                                Ok(s) => s.trim(),
                                                Err(e) => {
                                                    warn!(stream_id, "invalid UTF-8 in stream: {e}");
                                                    buffer.drain(..=newline_pos);
                                                    continue;
                                                }
                                            };

                                        let should_end =
                                            process_sse_line(line_str, &model, &tx_clone, stream_id);
                                        buffer.drain(..=newline_pos);
                                        if should_end {
                                            return;
                                        }
                                    }
                                }
                                Err(e) => {
                                    send_error(ChatError::StreamFailure {
                                        detail: e.to_string(),
                                    });
                                    return;
                                }
                            }
                        }

                        let _ = tx_clone.send((StreamMessage::End, stream_id));
                    }
                    Err(e) => {
                        send_error(ChatError::StreamFailure {
                            detail: e.to_string(),
                        });
                    }
                }
            };

            tokio::select! {
                _ = stream_body => {}
                _ = cancel_token.cancelled() => {
                    // The consumer is waiting on the channel, so a cancelled
                    // stream must still terminate with Error + End.
                    let _ = tx_clone.send((
                        StreamMessage::Error(ChatError::StreamFailure {
                            detail: "cancelled by user".to_string(),
                        }),
                        stream_id,
                    ));
                    let _ = tx_clone.send((StreamMessage::End, stream_id));
                }
                _ = tokio::time::sleep(REQUEST_TIMEOUT) => {
                    let _ = tx_clone.send((
                        StreamMessage::Error(ChatError::StreamFailure {
                            detail: format!(
                                "no response within {} seconds",
                                REQUEST_TIMEOUT.as_secs()
                            ),
                        }),
                        stream_id,
                    ));
                    let _ = tx_clone.send((StreamMessage::End, stream_id));
                }
            }
        });
    }

    #[cfg(test)]
    pub fn send_for_test(&self, message: StreamMessage, stream_id: u64) {
        let _ = self.tx.send((message, stream_id));
    }
}
