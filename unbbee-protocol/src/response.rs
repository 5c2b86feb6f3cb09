//! Response interpreter
//!
//! Classifies reply lines:
//!
//! | Line        | Meaning                        |
//! |-------------|--------------------------------|
//! | (empty)     | skipped                        |
//! | `OK`        | exchange succeeded             |
//! | `ERROR`     | exchange failed                |
//! | anything    | payload / unsolicited output   |
//!
//! Terminal tokens are matched case-sensitively against the whole line.

use unbbee_hal::{ByteChannel, Clock, Watchdog};

use crate::deadline::Deadline;
use crate::diag::DiagSink;
use crate::port::AtPort;

/// Default time to wait for a terminal `OK`
pub const DEFAULT_OK_TIMEOUT_MS: u32 = 4000;

/// Failed command exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AtError {
    /// No qualifying line or terminal token before the deadline
    Timeout,
    /// The device answered `ERROR`
    DeviceError,
}

/// Value line copied into a caller buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Captured {
    /// Number of bytes stored in the buffer
    pub len: usize,
    /// The reply did not fit; the stored value is a prefix
    pub truncated: bool,
}

impl Captured {
    /// The captured bytes within the buffer they were copied to
    pub fn value<'o>(&self, buffer: &'o [u8]) -> &'o [u8] {
        &buffer[..self.len.min(buffer.len())]
    }
}

impl<C, K, D, W, G> AtPort<'_, C, K, D, W, G>
where
    C: ByteChannel,
    K: Clock,
    W: Watchdog,
    G: DiagSink,
{
    /// Wait up to `timeout_ms` for `OK`
    ///
    /// The timeout covers the whole wait, not each line. Blank lines and
    /// unrelated output in between are skipped.
    pub fn wait_for_ok(&mut self, timeout_ms: u32) -> Result<(), AtError> {
        let deadline = self.deadline_in(timeout_ms);
        self.wait_for_ok_until(deadline)
    }

    /// Wait until `deadline` for `OK`
    pub fn wait_for_ok_until(&mut self, deadline: Deadline) -> Result<(), AtError> {
        loop {
            match self.read_line(deadline)? {
                b"OK" => return Ok(()),
                b"ERROR" => {
                    debug!("device replied ERROR");
                    return Err(AtError::DeviceError);
                }
                _ => {}
            }
        }
    }

    /// Capture the first non-empty reply line, then wait for `OK`
    ///
    /// The line is copied into `out`, truncated to fit. Lines after it are
    /// ignored until the terminal token, which is awaited for up to
    /// `ok_timeout_ms`. A timeout before any value arrives is reported
    /// right away. An `ERROR` in place of the value fails immediately.
    pub fn capture_value(
        &mut self,
        deadline: Deadline,
        out: &mut [u8],
        ok_timeout_ms: u32,
    ) -> Result<Captured, AtError> {
        let captured = loop {
            let line = self.read_line(deadline)?;
            if line.is_empty() {
                continue;
            }
            if line == b"ERROR" {
                debug!("device replied ERROR instead of a value");
                return Err(AtError::DeviceError);
            }
            let len = line.len().min(out.len());
            out[..len].copy_from_slice(&line[..len]);
            let truncated = len < line.len();
            break Captured {
                len,
                truncated: truncated || self.line.is_truncated(),
            };
        };

        if captured.truncated {
            warn!("captured value truncated to {=usize} bytes", captured.len);
        }
        trace!("captured {=[u8]:a}", &out[..captured.len]);

        self.wait_for_ok(ok_timeout_ms)?;
        Ok(captured)
    }
}
