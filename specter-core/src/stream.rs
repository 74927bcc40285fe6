//! Incremental response-stream frame decoder
//!
//! The analysis service answers with a stream of newline-terminated text
//! records (`event:` tag lines and `data:` payload lines). The transport
//! hands those records over as byte chunks with arbitrary boundaries: a
//! record may arrive split mid-token, one byte at a time, or bundled with
//! a dozen neighbors. [`FrameDecoder`] reassembles them.
//!
//! ## Algorithm
//!
//! A single growing byte buffer carries the unterminated tail between
//! chunks. Each `push` appends the chunk, drains every complete line, and
//! keeps the remainder (which may be empty) as the new tail. Buffering
//! bytes rather than decoded text keeps the output identical under any
//! chunking, even when a multi-byte UTF-8 sequence straddles a boundary.
//!
//! ## Error handling
//!
//! Malformed input never fails the decoder: undecodable bytes are decoded
//! lossily and stray lines are dropped with a trace message. The one hard
//! failure is the buffer cap, since a stream that never terminates a record
//! would otherwise grow the tail without bound, so exceeding
//! [`DEFAULT_MAX_BUFFER`] is a [`Error::Stream`] and ends the session.
//!
//! A decoder serves exactly one stream; create a fresh one per request.

use crate::error::{Error, Result};

/// Cap on the unterminated tail, in bytes (1 MiB).
///
/// Well above any legitimate single record: payloads are short JSON
/// objects, and even a completion summary is a few KiB.
pub const DEFAULT_MAX_BUFFER: usize = 1024 * 1024;

/// One complete `data:` record extracted from the byte stream.
///
/// Transient: frames are handed to the classifier and not retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// The most recent preceding `event:` tag, if any.
    ///
    /// Informational only: the tag may be absent, stale, or disagree
    /// with the payload, so downstream classification goes by payload
    /// shape and is free to ignore this.
    pub event: Option<String>,
    /// The `data:` line's value with the token and surrounding
    /// whitespace stripped; never empty.
    pub payload: String,
}

/// Reassembles complete frames from arbitrarily fragmented byte chunks.
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    pending_event: Option<String>,
    max_buffer: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::with_max_buffer(DEFAULT_MAX_BUFFER)
    }

    /// Create a decoder with a custom tail cap (for tests and tuning)
    pub fn with_max_buffer(max_buffer: usize) -> Self {
        Self {
            buffer: Vec::new(),
            pending_event: None,
            max_buffer,
        }
    }

    /// Feed one transport chunk; returns every frame it completed.
    ///
    /// Errors only when the unterminated tail exceeds the buffer cap.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<RawFrame>> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            // Drop the terminator and an optional preceding CR
            let line = &line[..pos];
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if let Some(frame) = self.accept_line(line) {
                frames.push(frame);
            }
        }

        if self.buffer.len() > self.max_buffer {
            return Err(Error::Stream(format!(
                "unterminated record exceeds {} byte buffer cap",
                self.max_buffer
            )));
        }

        Ok(frames)
    }

    /// Signal end-of-stream.
    ///
    /// Any unterminated tail cannot be a complete record and is
    /// discarded; returns the number of bytes dropped for diagnostics.
    pub fn finish(self) -> usize {
        if !self.buffer.is_empty() {
            tracing::debug!(
                bytes = self.buffer.len(),
                "discarding unterminated trailing bytes at end of stream"
            );
        }
        self.buffer.len()
    }

    /// Classify one complete line, emitting a frame for `data:` lines.
    fn accept_line(&mut self, line: &[u8]) -> Option<RawFrame> {
        let text = String::from_utf8_lossy(line);
        if let Some(rest) = text.strip_prefix("event:") {
            let tag = rest.trim();
            if !tag.is_empty() {
                self.pending_event = Some(tag.to_string());
            }
            None
        } else if let Some(rest) = text.strip_prefix("data:") {
            let payload = rest.trim();
            if payload.is_empty() {
                // Keep-alive or blank separator
                return None;
            }
            Some(RawFrame {
                event: self.pending_event.take(),
                payload: payload.to_string(),
            })
        } else {
            if !text.trim().is_empty() {
                tracing::trace!(line = %text, "dropping unrecognized stream line");
            }
            None
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}
