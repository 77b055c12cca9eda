//! Incremental decoder for the chat event stream.
//!
//! The wire format is SSE-shaped: frames separated by a blank line, each
//! frame carrying one `event:` line and one or more `data:` lines. Chunks
//! arrive with no alignment to frame boundaries, so a partial frame is
//! buffered across reads and only yielded once its delimiter lands.

use std::pin::Pin;

use futures::{Stream, StreamExt};
use serde_json::Value;

use dandori_types::event::RawEvent;
use dandori_types::Result;

/// Delimiter between wire frames
const FRAME_SEPARATOR: &str = "\n\n";

/// Pull-based decoder over an incremental text chunk source.
/// Forward-only and non-restartable: once the source ends, so does this.
pub struct EventDecoder {
    source: Pin<Box<dyn Stream<Item = Result<String>>>>,
    buffer: String,
    done: bool,
}

impl EventDecoder {
    pub fn new(source: Pin<Box<dyn Stream<Item = Result<String>>>>) -> Self {
        Self {
            source,
            buffer: String::new(),
            done: false,
        }
    }

    /// Next decoded event, in strict arrival order.
    ///
    /// `Ok(None)` means the source is exhausted; a trailing partial frame
    /// with no terminating delimiter is dropped at that point. Read errors
    /// propagate to the caller as transport failures.
    pub async fn next_event(&mut self) -> Result<Option<RawEvent>> {
        loop {
            if let Some(event) = self.pop_frame() {
                return Ok(Some(event));
            }
            if self.done {
                return Ok(None);
            }
            match self.source.next().await {
                Some(Ok(chunk)) => self.buffer.push_str(&chunk),
                Some(Err(e)) => return Err(e),
                None => self.done = true,
            }
        }
    }

    /// Take the next complete frame off the buffer, skipping frames that
    /// decode to nothing.
    fn pop_frame(&mut self) -> Option<RawEvent> {
        while let Some(idx) = self.buffer.find(FRAME_SEPARATOR) {
            let frame: String = self.buffer.drain(..idx + FRAME_SEPARATOR.len()).collect();
            if let Some(event) = parse_frame(frame.trim_end_matches(FRAME_SEPARATOR)) {
                return Some(event);
            }
        }
        None
    }
}

/// Parse one delimiter-framed event.
///
/// Multiple `data:` lines concatenate without a separator. Frames with no
/// event name or an empty payload are discarded (`None`). A payload that is
/// not valid JSON is kept as a raw string — malformed data never fails the
/// decode.
pub fn parse_frame(frame: &str) -> Option<RawEvent> {
    let mut event_name: Option<&str> = None;
    let mut payload = String::new();

    for line in frame.split('\n') {
        if let Some(rest) = line.strip_prefix("event:") {
            event_name = Some(rest.trim());
        } else if let Some(rest) = line.strip_prefix("data:") {
            payload.push_str(rest.trim());
        }
    }

    let event = event_name?;
    if event.is_empty() || payload.is_empty() {
        return None;
    }

    let data = serde_json::from_str(&payload).unwrap_or(Value::String(payload));
    Some(RawEvent {
        event: event.to_string(),
        data,
    })
}
