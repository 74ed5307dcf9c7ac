//! Tokio codec for the line protocol.
//!
//! `LineCodec` wraps a [`LineBuffer`] so the same overflow and encoding
//! policy applies whether lines are pulled by the kiosk's non-blocking poll
//! or by an async peer through `tokio_util::codec::Framed`.
//!
//! ```rust,no_run
//! use futures::{SinkExt, StreamExt};
//! use locker_protocol::LineCodec;
//! use tokio::net::TcpStream;
//! use tokio_util::codec::Framed;
//!
//! # async fn example() -> locker_core::Result<()> {
//! let stream = TcpStream::connect("127.0.0.1:7070").await?;
//! let mut framed = Framed::new(stream, LineCodec::new());
//!
//! while let Some(line) = framed.next().await {
//!     let line = line?;
//!     framed.send(format!("echo {line}")).await?;
//! }
//! # Ok(())
//! # }
//! ```

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::LineBuffer;
use locker_core::constants::{LINE_TERMINATOR, MAX_LINE_LENGTH};
use locker_core::{Error, Result};

/// Newline-delimited text codec with bounded line length.
#[derive(Debug, Default)]
pub struct LineCodec {
    lines: LineBuffer,
}

impl LineCodec {
    /// Create a codec with the protocol's default maximum line length.
    pub fn new() -> Self {
        Self {
            lines: LineBuffer::new(),
        }
    }

    /// Create a codec with a custom maximum line length.
    pub fn with_max_line_length(max_line_length: usize) -> Self {
        Self {
            lines: LineBuffer::with_max_line_length(max_line_length),
        }
    }

    /// Lines dropped by the overflow or encoding policy so far.
    pub fn discarded_lines(&self) -> u64 {
        self.lines.discarded_lines()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if !src.is_empty() {
            // All bytes move into the line buffer, which owns partial data.
            self.lines.feed(src);
            src.clear();
        }

        Ok(self.lines.next_line())
    }
}

impl<T: AsRef<str>> Encoder<T> for LineCodec {
    type Error = Error;

    /// Write `item` followed by the line terminator.
    ///
    /// # Errors
    ///
    /// Returns an error if the text contains a terminator of its own or is
    /// longer than [`MAX_LINE_LENGTH`].
    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<()> {
        let text = item.as_ref();

        if text.as_bytes().contains(&LINE_TERMINATOR) {
            return Err(Error::InvalidMessageFormat(
                "line contains an embedded terminator".to_string(),
            ));
        }
        if text.len() > MAX_LINE_LENGTH {
            return Err(Error::LineTooLong {
                max: MAX_LINE_LENGTH,
            });
        }

        dst.reserve(text.len() + 1);
        dst.extend_from_slice(text.as_bytes());
        dst.extend_from_slice(&[LINE_TERMINATOR]);
        Ok(())
    }
}
