//! Streaming completion decoding
//!
//! Streaming responses arrive as a line-oriented event body: each event is a
//! `data: ` prefixed line holding either a JSON fragment with an incremental
//! content delta or the literal sentinel `[DONE]` that terminates the
//! stream. [`DeltaStream`] exposes this as a forward-only lazy sequence of
//! text deltas: each [`DeltaStream::next_delta`] call suspends until bytes
//! arrive or the stream ends. Malformed fragments are logged and skipped,
//! never fatal.

use memchr::memchr;
use tracing::warn;

use crate::api::error::{extract_error_summary, ApiError};
use crate::api::ChatStreamResponse;

/// Decoded content of one `data:` line.
#[derive(Debug, PartialEq, Eq)]
enum Frame {
    /// An incremental content delta.
    Delta(String),
    /// The `[DONE]` sentinel.
    Done,
    /// Nothing usable: a non-event line, an empty delta, or a malformed
    /// fragment already logged.
    Skip,
    /// A well-formed error envelope sent mid-stream.
    ProviderError(String),
}

fn decode_frame(line: &str) -> Frame {
    let Some(payload) = line.strip_prefix("data:").map(str::trim_start) else {
        return Frame::Skip;
    };
    if payload == "[DONE]" {
        return Frame::Done;
    }
    if payload.is_empty() {
        return Frame::Skip;
    }

    match serde_json::from_str::<ChatStreamResponse>(payload) {
        Ok(frame) => match frame.choices.into_iter().next().and_then(|c| c.delta.content) {
            Some(content) => Frame::Delta(content),
            None => Frame::Skip,
        },
        Err(_) => {
            // An error envelope is a provider failure, not a framing glitch.
            if let Some(summary) = extract_error_summary(payload) {
                return Frame::ProviderError(summary);
            }
            warn!(payload, "skipping malformed stream fragment");
            Frame::Skip
        }
    }
}

/// A forward-only sequence of content deltas for one streaming request.
pub struct DeltaStream {
    response: reqwest::Response,
    buffer: Vec<u8>,
    done: bool,
}

impl DeltaStream {
    pub(crate) fn new(response: reqwest::Response) -> Self {
        Self {
            response,
            buffer: Vec::new(),
            done: false,
        }
    }

    /// The next content delta, in arrival order.
    ///
    /// Returns `Ok(None)` once the `[DONE]` sentinel (or the underlying
    /// body) ends the stream; every later call returns `Ok(None)` as well.
    pub async fn next_delta(&mut self) -> Result<Option<String>, ApiError> {
        loop {
            if self.done {
                return Ok(None);
            }

            while let Some(newline) = memchr(b'\n', &self.buffer) {
                let frame = match std::str::from_utf8(&self.buffer[..newline]) {
                    Ok(line) => decode_frame(line.trim()),
                    Err(err) => {
                        warn!(%err, "skipping non-UTF-8 stream fragment");
                        Frame::Skip
                    }
                };
                self.buffer.drain(..=newline);

                match frame {
                    Frame::Delta(content) => return Ok(Some(content)),
                    Frame::Done => {
                        self.done = true;
                        return Ok(None);
                    }
                    Frame::ProviderError(message) => {
                        self.done = true;
                        return Err(ApiError::Provider {
                            status: self.response.status(),
                            message,
                        });
                    }
                    Frame::Skip => {}
                }
            }

            match self.response.chunk().await {
                Ok(Some(bytes)) => self.buffer.extend_from_slice(&bytes),
                Ok(None) => {
                    self.done = true;
                    return Ok(None);
                }
                Err(err) => {
                    self.done = true;
                    return Err(ApiError::Network(err));
                }
            }
        }
    }

    /// Drain the stream, concatenating every delta in arrival order.
    pub async fn collect_text(mut self) -> Result<String, ApiError> {
        let mut text = String::new();
        while let Some(delta) = self.next_delta().await? {
            text.push_str(&delta);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_frame_handles_spacing_variants() {
        assert_eq!(
            decode_frame(r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#),
            Frame::Delta("Hello".to_string())
        );
        assert_eq!(
            decode_frame(r#"data:{"choices":[{"delta":{"content":"World"}}]}"#),
            Frame::Delta("World".to_string())
        );
        assert_eq!(decode_frame("data: [DONE]"), Frame::Done);
        assert_eq!(decode_frame("data:[DONE]"), Frame::Done);
    }

    #[test]
    fn non_event_lines_are_skipped() {
        assert_eq!(decode_frame(""), Frame::Skip);
        assert_eq!(decode_frame(": keep-alive"), Frame::Skip);
        assert_eq!(decode_frame("event: done"), Frame::Skip);
        assert_eq!(decode_frame("data:"), Frame::Skip);
    }

    #[test]
    fn malformed_fragments_are_skipped_not_fatal() {
        assert_eq!(decode_frame("data: {truncated"), Frame::Skip);
        assert_eq!(decode_frame("data: 42"), Frame::Skip);
        assert_eq!(decode_frame(r#"data: {"choices":[]}"#), Frame::Skip);
    }

    #[test]
    fn empty_delta_frames_are_skipped() {
        assert_eq!(
            decode_frame(r#"data: {"choices":[{"delta":{}}]}"#),
            Frame::Skip
        );
    }

    #[test]
    fn error_envelopes_surface_as_provider_errors() {
        assert_eq!(
            decode_frame(r#"data: {"error":{"message":"internal server error"}}"#),
            Frame::ProviderError("internal server error".to_string())
        );
    }
}
