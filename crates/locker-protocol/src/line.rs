//! Bounded line accumulator for the link byte stream.
//!
//! The serial-profile link delivers bytes in arbitrary chunks: a single read
//! may contain half a reply, one reply, or several. [`LineBuffer`] owns the
//! partial data between reads and hands back one complete line at a time.
//!
//! # Overflow Policy
//!
//! A peer that never sends a terminator must not grow the buffer without
//! bound. When the unterminated tail exceeds the maximum line length, the tail
//! is dropped and the buffer enters [`LineState::Discarding`]: every byte up
//! to and including the next terminator is thrown away, after which normal
//! reading resumes with the following line.
//!
//! ```text
//! ┌─────────┐  tail > max_line_length  ┌────────────┐
//! │ Reading │─────────────────────────>│ Discarding │
//! └─────────┘                          └────────────┘
//!      ^                                     │
//!      └───────────── terminator ────────────┘
//! ```
//!
//! Complete lines waiting to be read are bounded too. Lines that arrive
//! while the buffer is full are dropped, newest first, so a reply already
//! queued is never lost to a burst that follows it. Readers that can hold
//! bytes back should feed no more than [`LineBuffer::spare_capacity`].
//!
//! # Usage
//!
//! ```
//! use locker_protocol::LineBuffer;
//!
//! let mut lines = LineBuffer::new();
//! lines.feed(b"O");
//! assert_eq!(lines.next_line(), None);
//!
//! lines.feed(b"K\nDENIED\n");
//! assert_eq!(lines.next_line().as_deref(), Some("OK"));
//! assert_eq!(lines.next_line().as_deref(), Some("DENIED"));
//! assert_eq!(lines.next_line(), None);
//! ```

use bytes::BytesMut;
use locker_core::constants::{LINE_TERMINATOR, MAX_LINE_LENGTH};

/// Number of maximum-length lines that may wait in the buffer before newer
/// lines are dropped.
const MAX_PENDING_LINES: usize = 8;

/// Whether the buffer is accepting bytes or skipping an overlong line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineState {
    /// Accumulating bytes of the current line.
    Reading,

    /// Dropping bytes until the next terminator.
    Discarding,
}

/// Accumulates link bytes and yields complete, newline-terminated lines.
///
/// Lines are returned without the terminator; a trailing carriage return is
/// stripped as well. Lines that are too long or not valid UTF-8 are dropped
/// and counted in [`discarded_lines`](LineBuffer::discarded_lines).
#[derive(Debug)]
pub struct LineBuffer {
    /// Complete lines followed by at most one partial line.
    buffer: BytesMut,

    state: LineState,

    max_line_length: usize,

    /// Lines dropped by the overflow or encoding policy.
    discarded: u64,
}

impl LineBuffer {
    /// Create a buffer with the protocol's default maximum line length.
    pub fn new() -> Self {
        Self::with_max_line_length(MAX_LINE_LENGTH)
    }

    /// Create a buffer with a custom maximum line length.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `max_line_length` is zero.
    pub fn with_max_line_length(max_line_length: usize) -> Self {
        debug_assert!(max_line_length > 0, "max_line_length must be positive");

        Self {
            buffer: BytesMut::with_capacity(max_line_length + 1),
            state: LineState::Reading,
            max_line_length,
            discarded: 0,
        }
    }

    /// Append bytes received from the link.
    pub fn feed(&mut self, bytes: &[u8]) {
        let mut bytes = bytes;

        if self.state == LineState::Discarding {
            match bytes.iter().position(|&b| b == LINE_TERMINATOR) {
                Some(pos) => {
                    bytes = &bytes[pos + 1..];
                    self.state = LineState::Reading;
                }
                None => return,
            }
        }

        self.buffer.extend_from_slice(bytes);
        self.enforce_limits();
    }

    /// Take the oldest complete line, if any.
    ///
    /// Returns at most one line per call; further complete lines stay
    /// buffered for subsequent calls.
    pub fn next_line(&mut self) -> Option<String> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == LINE_TERMINATOR) {
            let mut line = self.buffer.split_to(pos + 1);
            line.truncate(pos);
            if line.last() == Some(&b'\r') {
                line.truncate(pos - 1);
            }

            if line.len() > self.max_line_length {
                self.discarded += 1;
                continue;
            }

            match String::from_utf8(line.to_vec()) {
                Ok(text) => return Some(text),
                Err(_) => self.discarded += 1,
            }
        }

        None
    }

    /// Whether a complete line is waiting.
    pub fn has_line(&self) -> bool {
        self.buffer.contains(&LINE_TERMINATOR)
    }

    /// Number of bytes currently held.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Current overflow state.
    pub fn state(&self) -> LineState {
        self.state
    }

    /// Total number of lines dropped since creation.
    pub fn discarded_lines(&self) -> u64 {
        self.discarded
    }

    /// Maximum accepted line length, terminator excluded.
    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }

    /// Bytes that can still be fed without dropping a line.
    pub fn spare_capacity(&self) -> usize {
        self.max_pending().saturating_sub(self.buffer.len())
    }

    /// Upper bound on buffered bytes: pending CRLF lines of maximum length.
    fn max_pending(&self) -> usize {
        MAX_PENDING_LINES * (self.max_line_length + 2)
    }

    /// Drop all buffered bytes and return to [`LineState::Reading`].
    ///
    /// Called when the underlying connection is replaced, so that a partial
    /// line from the old peer cannot prefix the first line of the new one.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.state = LineState::Reading;
    }

    fn enforce_limits(&mut self) {
        let tail_start = self
            .buffer
            .iter()
            .rposition(|&b| b == LINE_TERMINATOR)
            .map_or(0, |pos| pos + 1);

        // A carriage return may still be followed by the terminator
        let tail = &self.buffer[tail_start..];
        let limit = if tail.last() == Some(&b'\r') {
            self.max_line_length + 1
        } else {
            self.max_line_length
        };
        if tail.len() > limit {
            self.buffer.truncate(tail_start);
            self.state = LineState::Discarding;
            self.discarded += 1;
        }

        let max_pending = self.max_pending();
        if self.buffer.len() > max_pending {
            let keep = self.buffer[..max_pending]
                .iter()
                .rposition(|&b| b == LINE_TERMINATOR)
                .map_or(0, |pos| pos + 1);

            let dropped = &self.buffer[keep..];
            let dropped_lines = dropped.iter().filter(|&&b| b == LINE_TERMINATOR).count();
            let partial = dropped.last() != Some(&LINE_TERMINATOR);
            if partial {
                self.state = LineState::Discarding;
            }
            self.discarded += dropped_lines as u64 + u64::from(partial);
            self.buffer.truncate(keep);
        }
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}
