//! Line reader
//!
//! Turns the raw byte stream into lines. Modems are inconsistent about line
//! endings: most replies end in CR+LF, some in a bare CR, a few in a bare
//! LF. After a CR the reader gives an LF [`LF_GRACE_MS`] to show up before
//! it declares the line finished, so a bare-CR line costs at most that much
//! extra latency and a CR+LF line is never split in two.
//!
//! ```text
//!          ┌──────── other byte: store ────────┐
//!          ▼                                   │
//!     ┌────────┐ ── CR ──▶ ┌────────┐          │
//!     │ Normal │           │ SeenCr │ ── LF ───┼──▶ line complete
//!     └────────┘ ◀─ CR ─── └────────┘          │
//!          │                │  peek: other byte│ or grace expired
//!          └──── LF ────────┴──────────────────┴──▶ line complete
//! ```

use heapless::Vec;
use unbbee_hal::{ByteChannel, Clock, Watchdog};

use crate::deadline::Deadline;
use crate::diag::DiagSink;
use crate::port::AtPort;
use crate::response::AtError;

/// Line buffer capacity in bytes
pub const LINE_CAPACITY: usize = 64;

/// How long to wait for an optional LF after a CR
pub const LF_GRACE_MS: u32 = 50;

pub(crate) const CR: u8 = b'\r';
pub(crate) const LF: u8 = b'\n';

/// Most recently decoded line
///
/// Bytes beyond [`LINE_CAPACITY`] are dropped and the line is flagged as
/// truncated; the terminator is still consumed from the channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuffer {
    bytes: Vec<u8, LINE_CAPACITY>,
    truncated: bool,
}

impl LineBuffer {
    /// Create an empty buffer
    pub const fn new() -> Self {
        Self {
            bytes: Vec::new(),
            truncated: false,
        }
    }

    /// Reset to an empty line
    pub fn clear(&mut self) {
        self.bytes.clear();
        self.truncated = false;
    }

    /// Append a byte, dropping it when the buffer is full
    pub fn push(&mut self, byte: u8) {
        if self.bytes.push(byte).is_err() {
            self.truncated = true;
        }
    }

    /// Line content without terminator
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of stored bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check for an empty line
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Check whether bytes were dropped
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineState {
    Normal,
    SeenCr { lf_deadline: Deadline },
}

impl<C, K, D, W, G> AtPort<'_, C, K, D, W, G>
where
    C: ByteChannel,
    K: Clock,
    W: Watchdog,
    G: DiagSink,
{
    /// Read one line, giving up at `deadline`
    ///
    /// Returns the line content without its terminator. An empty slice is a
    /// blank line, not an error. The content stays available through
    /// [`line`](AtPort::line) until the next read.
    pub fn read_line(&mut self, deadline: Deadline) -> Result<&[u8], AtError> {
        self.line.clear();
        let mut state = LineState::Normal;

        while !self.is_expired(deadline) {
            self.watchdog.feed();

            if let LineState::SeenCr { lf_deadline } = state {
                match self.channel.peek_byte() {
                    // Only the LF is consumed below
                    Some(LF) => {}
                    // Line ended with just <CR>; the next byte stays queued
                    Some(_) => return Ok(self.line.as_bytes()),
                    None if self.is_expired(lf_deadline) => return Ok(self.line.as_bytes()),
                    None => continue,
                }
            }

            let Some(byte) = self.channel.try_read_byte() else {
                continue;
            };
            self.diag.write(&[byte]);

            state = LineState::Normal;
            match byte {
                CR => {
                    state = LineState::SeenCr {
                        lf_deadline: self.deadline_in(LF_GRACE_MS),
                    }
                }
                LF => return Ok(self.line.as_bytes()),
                _ => self.line.push(byte),
            }
        }

        trace!("read_line timed out at {=u32}", deadline.instant_ms());
        self.diag.write(b"<timeout>\r\n");
        Err(AtError::Timeout)
    }
}
