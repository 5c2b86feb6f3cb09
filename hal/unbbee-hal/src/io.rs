//! `embedded-io` adapter
//!
//! Most HALs expose their buffered UARTs through the `embedded-io` traits.
//! Those traits have no peek, so [`IoChannel`] keeps a one-byte lookahead
//! slot in front of the port.

use embedded_io::{Read, ReadReady, Write};

use crate::channel::ByteChannel;

/// [`ByteChannel`] over any non-blocking `embedded-io` port
///
/// Read errors are reported as "no byte available". Write errors are
/// dropped: the channel contract treats transmission as best-effort.
pub struct IoChannel<T> {
    port: T,
    lookahead: Option<u8>,
}

impl<T> IoChannel<T> {
    /// Wrap a port
    pub fn new(port: T) -> Self {
        Self {
            port,
            lookahead: None,
        }
    }

    /// Get access to the underlying port
    pub fn port(&self) -> &T {
        &self.port
    }

    /// Get mutable access to the underlying port
    pub fn port_mut(&mut self) -> &mut T {
        &mut self.port
    }

    /// Release the port
    ///
    /// A byte held in the lookahead slot is lost.
    pub fn into_inner(self) -> T {
        self.port
    }
}

impl<T: Read + ReadReady> IoChannel<T> {
    fn fetch(&mut self) -> Option<u8> {
        // `read` blocks on an empty buffer, so only call it when ready
        match self.port.read_ready() {
            Ok(true) => {}
            _ => return None,
        }
        let mut buf = [0u8; 1];
        match self.port.read(&mut buf) {
            Ok(1) => Some(buf[0]),
            _ => None,
        }
    }
}

impl<T: Read + ReadReady + Write> ByteChannel for IoChannel<T> {
    fn try_read_byte(&mut self) -> Option<u8> {
        match self.lookahead.take() {
            Some(byte) => Some(byte),
            None => self.fetch(),
        }
    }

    fn peek_byte(&mut self) -> Option<u8> {
        if self.lookahead.is_none() {
            self.lookahead = self.fetch();
        }
        self.lookahead
    }

    fn write(&mut self, data: &[u8]) {
        let _ = self.port.write_all(data);
    }
}
