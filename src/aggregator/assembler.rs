//! Incremental Message Framing
//!
//! This module implements the per-connection framing state machine. TCP is a
//! stream protocol: a single read may carry a fragment of a request, or a
//! whole request plus trailing bytes. The [`Assembly`] accumulates chunks
//! and decides where the message ends.
//!
//! ## State Machine
//!
//! ```text
//! Headers ──(found "\r\n\r\n")──> Body ──(buffered >= Content-Length)──> complete
//! ```
//!
//! There is no transition back. Each connection is framed at most once; the
//! aggregator removes the assembly the instant a message is produced.
//!
//! ## Parse Once
//!
//! Once the header terminator is found, the header block is split off,
//! scanned once for `Content-Length`, and never searched again. Subsequent
//! chunks only extend the body accumulator and compare lengths. Chunking
//! granularity therefore cannot affect the produced message: feeding the
//! same bytes one at a time or in a single burst yields an identical
//! [`FramedMessage`].

use crate::protocol::parser::{content_length, FramingResult};
use crate::protocol::types::{FramedMessage, HEADER_TERMINATOR};
use bytes::{Bytes, BytesMut};

/// Per-connection accumulation state.
///
/// An assembly exists only between a connection's registration and the
/// completion of its single message; the aggregator removes it as soon as
/// [`Assembly::push`] produces a frame or fails.
#[derive(Debug)]
pub enum Assembly {
    /// Accumulating bytes while searching for the header terminator.
    Headers {
        buffer: BytesMut,
    },

    /// Header block framed; accumulating the declared body length.
    Body {
        header: Bytes,
        content_length: usize,
        buffer: BytesMut,
    },
}

impl Assembly {
    /// Creates an empty assembly in the header-accumulation state.
    pub fn new() -> Self {
        Assembly::Headers {
            buffer: BytesMut::new(),
        }
    }

    /// Feeds one chunk of bytes into the state machine.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(message))` - the message is complete; the assembly is spent
    /// - `Ok(None)` - incomplete, more chunks are needed
    /// - `Err(e)` - the declared `Content-Length` is unparsable
    pub fn push(&mut self, payload: &[u8]) -> FramingResult<Option<FramedMessage>> {
        match self {
            Assembly::Headers { buffer } => {
                // The terminator may straddle the chunk boundary, so resume
                // the search a few bytes before the previous end.
                let search_from = buffer.len().saturating_sub(HEADER_TERMINATOR.len() - 1);
                buffer.extend_from_slice(payload);

                let Some(pos) = find_terminator(buffer, search_from) else {
                    return Ok(None);
                };

                let mut remaining = std::mem::take(buffer);
                let header = remaining.split_to(pos + HEADER_TERMINATOR.len()).freeze();
                let declared = content_length(&header)?;

                *self = Assembly::Body {
                    header,
                    content_length: declared,
                    buffer: remaining,
                };
                self.try_complete()
            }
            Assembly::Body { buffer, .. } => {
                buffer.extend_from_slice(payload);
                self.try_complete()
            }
        }
    }

    /// The number of bytes currently buffered.
    pub fn buffered(&self) -> usize {
        match self {
            Assembly::Headers { buffer } => buffer.len(),
            Assembly::Body { header, buffer, .. } => header.len() + buffer.len(),
        }
    }

    fn try_complete(&mut self) -> FramingResult<Option<FramedMessage>> {
        let Assembly::Body {
            header,
            content_length,
            buffer,
        } = self
        else {
            return Ok(None);
        };

        if buffer.len() < *content_length {
            return Ok(None);
        }

        // Anything past the declared length is pipelining residue; discard it.
        buffer.truncate(*content_length);
        let message = FramedMessage {
            header: header.clone(),
            body: std::mem::take(buffer).freeze(),
        };
        Ok(Some(message))
    }
}

impl Default for Assembly {
    fn default() -> Self {
        Self::new()
    }
}

/// Finds the header terminator in the buffer, searching from `from`.
///
/// Returns the position of the first byte of `\r\n\r\n`, or None.
#[inline]
fn find_terminator(buf: &[u8], from: usize) -> Option<usize> {
    let width = HEADER_TERMINATOR.len();
    for i in from..buf.len().saturating_sub(width - 1) {
        if &buf[i..i + width] == HEADER_TERMINATOR {
            return Some(i);
        }
    }
    None
}
