//! Command framer
//!
//! A command goes out as `<body><CR>`, with no LF. Before the body the
//! framer drains whatever is still sitting in the receive buffer from the
//! previous exchange and waits [`COMMAND_DELAY_MS`], which the modem needs
//! between commands.
//!
//! The body can be built from several fragments:
//!
//! ```ignore
//! port.begin_command();
//! port.append("AT$SS=");
//! port.append(payload_hex);
//! port.end_command();
//! ```

use core::fmt::Write as _;

use embedded_hal::delay::DelayNs;
use heapless::String;
use unbbee_hal::{ByteChannel, Watchdog};

use crate::diag::DiagSink;
use crate::line::CR;
use crate::port::AtPort;

/// Quiet time before each command
pub const COMMAND_DELAY_MS: u32 = 50;

/// Transcript marker preceding each transmitted command
const TX_MARKER: &[u8] = b">> ";

/// Something that can be written verbatim into a command body
///
/// Strings and byte slices are sent as-is, a `u8` as one raw byte, a
/// `char` UTF-8 encoded, and integers as unpadded decimal text.
pub trait CommandFragment {
    /// Call `f` with the wire bytes of this fragment
    fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R;
}

impl<T: CommandFragment + ?Sized> CommandFragment for &T {
    fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        (**self).with_bytes(f)
    }
}

impl CommandFragment for str {
    fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self.as_bytes())
    }
}

impl CommandFragment for [u8] {
    fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self)
    }
}

impl<const N: usize> CommandFragment for [u8; N] {
    fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self)
    }
}

impl CommandFragment for u8 {
    fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&[*self])
    }
}

impl CommandFragment for char {
    fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let mut buf = [0u8; 4];
        f(self.encode_utf8(&mut buf).as_bytes())
    }
}

macro_rules! decimal_fragment {
    ($($ty:ty),*) => {$(
        impl CommandFragment for $ty {
            fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
                // "-2147483648" is the longest rendering
                let mut text: String<11> = String::new();
                let _ = write!(text, "{}", self);
                f(text.as_bytes())
            }
        }
    )*};
}

decimal_fragment!(i16, u16, i32, u32);

impl<C, K, D, W, G> AtPort<'_, C, K, D, W, G>
where
    C: ByteChannel,
    D: DelayNs,
    W: Watchdog,
    G: DiagSink,
{
    /// Drop every byte waiting in the receive buffer
    ///
    /// Returns the number of bytes discarded. They still go to the
    /// diagnostic sink.
    pub fn flush_input(&mut self) -> usize {
        let mut flushed = 0;
        while let Some(byte) = self.channel.try_read_byte() {
            self.watchdog.feed();
            self.diag.write(&[byte]);
            flushed += 1;
        }
        flushed
    }

    /// Start a new command
    pub fn begin_command(&mut self) {
        let stale = self.flush_input();
        if stale > 0 {
            debug!("discarded {=usize} stale bytes", stale);
        }
        self.pause(COMMAND_DELAY_MS);
        self.diag.write(TX_MARKER);
    }

    /// Add a fragment to the command body
    ///
    /// No escaping is applied; the caller is responsible for a valid body.
    pub fn append<F: CommandFragment>(&mut self, fragment: F) {
        let channel = &mut self.channel;
        let diag = &mut self.diag;
        fragment.with_bytes(|bytes| {
            diag.write(bytes);
            channel.write(bytes);
        });
    }

    /// Terminate the command with a single CR
    pub fn end_command(&mut self) {
        self.diag.write(b"\r\n");
        self.channel.write(&[CR]);
    }

    /// Send a complete single-fragment command
    pub fn send_command<F: CommandFragment>(&mut self, body: F) {
        self.begin_command();
        self.append(body);
        self.end_command();
    }
}
