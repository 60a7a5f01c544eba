//! Server-sent-events decoding for the progress channel.
//!
//! Only `data:` fields matter to this service; `event:`, `id:` and `retry:`
//! are ignored, comments are dropped, and consecutive `data:` lines are
//! joined with `\n`. An event is dispatched on a blank line.

use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;

use futures_util::{Stream, StreamExt, stream};
use thiserror::Error;
use tracing::{trace, warn};

use super::wire::ProgressEvent;

/// Transport-level failure of an open progress channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The byte stream failed mid-read.
    #[error("progress stream failed: {0}")]
    Transport(String),
}

/// Ordered stream of decoded progress events for one job.
///
/// The stream ends without an item when the server closes the connection.
pub type ProgressStream = Pin<Box<dyn Stream<Item = Result<ProgressEvent, ChannelError>> + Send>>;

/// Incremental line decoder for `text/event-stream` bodies.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    /// Feeds one network chunk; returns the payloads of completed events.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut completed = Vec::new();

        while let Some(newline) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=newline).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(payload) = self.process_line(&line) {
                completed.push(payload);
            }
        }

        completed
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            if self.data.is_empty() {
                return None;
            }
            let payload = self.data.join("\n");
            self.data.clear();
            return Some(payload);
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            self.data.push(value.to_string());
        } else {
            trace!(field, "ignoring event-stream field");
        }
        None
    }
}

/// Decodes a byte stream into progress events.
///
/// Frames whose payload is not a progress-event object are logged and
/// skipped. A byte-stream error ends the stream after yielding one
/// [`ChannelError::Transport`].
pub fn decode_event_stream<S, B, E>(bytes: S) -> ProgressStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]>,
    E: fmt::Display,
{
    let initial = Some((Box::pin(bytes), SseDecoder::default(), VecDeque::<String>::new()));
    Box::pin(stream::unfold(initial, |state| async move {
        let (mut bytes, mut decoder, mut pending) = state?;
        loop {
            if let Some(payload) = pending.pop_front() {
                match ProgressEvent::from_json(&payload) {
                    Ok(event) => return Some((Ok(event), Some((bytes, decoder, pending)))),
                    Err(error) => {
                        warn!(%error, "skipping undecodable progress event");
                        continue;
                    }
                }
            }
            match bytes.next().await {
                Some(Ok(chunk)) => pending.extend(decoder.push(chunk.as_ref())),
                Some(Err(error)) => {
                    return Some((Err(ChannelError::Transport(error.to_string())), None));
                }
                None => return None,
            }
        }
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::wire::ProgressStatus;

    #[test]
    fn test_decoder_dispatches_on_blank_line() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push(b"data: {\"a\":1}\n").is_empty());
        assert_eq!(decoder.push(b"\n"), vec!["{\"a\":1}".to_string()]);
    }

    #[test]
    fn test_decoder_handles_chunk_boundaries_inside_lines() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push(b"da").is_empty());
        assert!(decoder.push(b"ta: hel").is_empty());
        assert_eq!(decoder.push(b"lo\r\n\r\n"), vec!["hello".to_string()]);
    }

    #[test]
    fn test_decoder_joins_multiline_data_and_skips_comments() {
        let mut decoder = SseDecoder::default();
        let events = decoder.push(b": keep-alive\nevent: progress\ndata: one\ndata:two\nid: 7\n\n");
        assert_eq!(events, vec!["one\ntwo".to_string()]);
    }

    #[test]
    fn test_decoder_ignores_blank_lines_without_data() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push(b"\n\n: ping\n\n").is_empty());
    }

    #[tokio::test]
    async fn test_decode_event_stream_yields_events_in_order_and_skips_garbage() {
        let chunks: Vec<Result<Vec<u8>, String>> = vec![
            Ok(b"data: {\"status\":\"downloading\",\"progress\":10}\n\n".to_vec()),
            Ok(b"data: not-json\n\ndata: {\"status\":\"process".to_vec()),
            Ok(b"ing\",\"progress\":60}\n\n".to_vec()),
        ];
        let mut events = decode_event_stream(stream::iter(chunks));

        let first = events.next().await.unwrap().unwrap();
        assert_eq!(first.status, ProgressStatus::Downloading);
        let second = events.next().await.unwrap().unwrap();
        assert_eq!(second.status, ProgressStatus::Processing);
        assert_eq!(second.progress, Some(60.0));
        assert!(events.next().await.is_none(), "stream ends with the body");
    }

    #[tokio::test]
    async fn test_decode_event_stream_surfaces_transport_error_once() {
        let chunks: Vec<Result<Vec<u8>, String>> = vec![
            Ok(b"data: {\"status\":\"downloading\"}\n\n".to_vec()),
            Err("connection reset".to_string()),
            Ok(b"data: {\"status\":\"completed\"}\n\n".to_vec()),
        ];
        let mut events = decode_event_stream(stream::iter(chunks));

        assert!(events.next().await.unwrap().is_ok());
        let error = events.next().await.unwrap().unwrap_err();
        assert_eq!(error, ChannelError::Transport("connection reset".to_string()));
        assert!(events.next().await.is_none());
    }
}
