//! Workflow event stream.
//!
//! The API responds with server-sent events. Each frame carries a JSON
//! payload; frames with a `type` of `progress` or `error` are surfaced as
//! events, anything else is retained as the candidate terminal result.

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use serde_json::Value;
use std::pin::Pin;
use tracing::debug;

use ugc_models::{WorkflowEvent, WorkflowResult};

use crate::error::{ClientResult, WorkflowError};

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

/// An open workflow run: zero-or-more events followed by a terminal result.
pub struct WorkflowStream {
    inner: ByteStream,
    buf: Vec<u8>,
    last_payload: Option<Value>,
    exhausted: bool,
}

impl std::fmt::Debug for WorkflowStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowStream")
            .field("buf", &self.buf)
            .field("last_payload", &self.last_payload)
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}

impl WorkflowStream {
    pub(crate) fn new<S>(inner: S) -> Self
    where
        S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
    {
        Self {
            inner: Box::pin(inner),
            buf: Vec::new(),
            last_payload: None,
            exhausted: false,
        }
    }

    /// Next typed event, or `None` once the stream has ended.
    ///
    /// Frames that are neither `progress` nor `error` are not events; they
    /// are kept as the latest terminal-result candidate for [`done`].
    ///
    /// [`done`]: WorkflowStream::done
    pub async fn next_event(&mut self) -> ClientResult<Option<WorkflowEvent>> {
        loop {
            while let Some(frame) = take_frame(&mut self.buf) {
                if let Some(value) = parse_frame(&frame)? {
                    match value.get("type").and_then(Value::as_str) {
                        Some("progress") | Some("error") => {
                            let event: WorkflowEvent = serde_json::from_value(value)?;
                            return Ok(Some(event));
                        }
                        _ => {
                            debug!("Retaining terminal result candidate");
                            self.last_payload = Some(value);
                        }
                    }
                }
            }

            if self.exhausted {
                return Ok(None);
            }

            match self.inner.next().await {
                Some(Ok(chunk)) => self.buf.extend_from_slice(&chunk),
                Some(Err(e)) => return Err(WorkflowError::Network(e)),
                None => {
                    self.exhausted = true;
                    // A final frame may lack the trailing blank line
                    if !self.buf.is_empty() {
                        self.buf.extend_from_slice(b"\n\n");
                    }
                }
            }
        }
    }

    /// Consume the rest of the stream and return the terminal result.
    ///
    /// A trailing `error` event is folded into an error-flagged result so
    /// callers see exactly one failure signal.
    pub async fn done(mut self) -> ClientResult<WorkflowResult> {
        while let Some(event) = self.next_event().await? {
            if let WorkflowEvent::Error {
                node_id,
                message,
                error,
            } = event
            {
                return Ok(WorkflowResult {
                    result_type: Some("error".to_string()),
                    message,
                    error: error.or(Some("Workflow failed".to_string())),
                    node_id,
                    ..Default::default()
                });
            }
        }

        let payload = self.last_payload.take().ok_or(WorkflowError::MissingResult)?;
        let result: WorkflowResult = serde_json::from_value(payload)?;
        Ok(result)
    }
}

/// Pull one complete SSE frame out of the buffer, if present.
fn take_frame(buf: &mut Vec<u8>) -> Option<String> {
    let lf = find_subsequence(buf, b"\n\n");
    let crlf = find_subsequence(buf, b"\r\n\r\n");

    let (at, sep_len) = match (lf, crlf) {
        (Some(a), Some(b)) if b < a => (b, 4),
        (Some(a), _) => (a, 2),
        (None, Some(b)) => (b, 4),
        (None, None) => return None,
    };

    let frame: Vec<u8> = buf.drain(..at + sep_len).take(at).collect();
    Some(String::from_utf8_lossy(&frame).into_owned())
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Parse the data payload of one SSE frame.
fn parse_frame(frame: &str) -> ClientResult<Option<Value>> {
    let data: Vec<&str> = frame
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
        .collect();

    if data.is_empty() {
        return Ok(None);
    }

    let joined = data.join("\n");
    if joined == "[DONE]" {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(&joined)
        .map_err(|e| WorkflowError::InvalidEvent(format!("{}: {}", e, joined)))?;
    Ok(Some(value))
}
