//! Diagnostic transcript sink
//!
//! The engine mirrors every byte it flushes, receives and transmits to a
//! [`DiagSink`], which makes a serial console transcript like
//!
//! ```text
//! >> ATI7
//! 8622
//! OK
//! ```
//!
//! trivial to produce. The sink is always invoked; [`NoDiag`] discards.

use embedded_io::Write;
use heapless::Vec;

/// Receiver of raw transcript bytes
pub trait DiagSink {
    /// Record transcript bytes
    fn write(&mut self, bytes: &[u8]);
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoDiag;

impl DiagSink for NoDiag {
    fn write(&mut self, _bytes: &[u8]) {}
}

impl<S: DiagSink> DiagSink for Option<S> {
    fn write(&mut self, bytes: &[u8]) {
        if let Some(sink) = self {
            sink.write(bytes);
        }
    }
}

impl<S: DiagSink + ?Sized> DiagSink for &mut S {
    fn write(&mut self, bytes: &[u8]) {
        (**self).write(bytes)
    }
}

/// Transcript kept in memory; bytes past the capacity are dropped
impl<const N: usize> DiagSink for Vec<u8, N> {
    fn write(&mut self, bytes: &[u8]) {
        let room = N - self.len();
        let take = bytes.len().min(room);
        let _ = self.extend_from_slice(&bytes[..take]);
    }
}

/// Sink writing to an `embedded-io` port, e.g. a debug UART
///
/// Write errors are ignored; diagnostics never affect the exchange.
#[derive(Debug)]
pub struct IoDiag<W>(pub W);

impl<W: Write> DiagSink for IoDiag<W> {
    fn write(&mut self, bytes: &[u8]) {
        let _ = self.0.write_all(bytes);
    }
}
