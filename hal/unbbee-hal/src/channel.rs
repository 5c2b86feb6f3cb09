//! Byte channel abstraction
//!
//! The AT engine talks to the modem through a byte stream that can be
//! polled without blocking. Reads never wait: an empty receive buffer is
//! reported as `None` and the caller decides how long to keep polling.

/// Bidirectional serial byte stream
pub trait ByteChannel {
    /// Take the next received byte, if one is buffered
    fn try_read_byte(&mut self) -> Option<u8>;

    /// Look at the next received byte without consuming it
    ///
    /// A subsequent [`try_read_byte`](Self::try_read_byte) returns the
    /// same byte.
    fn peek_byte(&mut self) -> Option<u8>;

    /// Write data to the channel
    ///
    /// May block until the data has been queued. Transmission is
    /// best-effort: physical-layer faults are the implementation's concern.
    fn write(&mut self, data: &[u8]);
}

impl<T: ByteChannel + ?Sized> ByteChannel for &mut T {
    fn try_read_byte(&mut self) -> Option<u8> {
        (**self).try_read_byte()
    }

    fn peek_byte(&mut self) -> Option<u8> {
        (**self).peek_byte()
    }

    fn write(&mut self, data: &[u8]) {
        (**self).write(data)
    }
}

/// Serial line settings for the modem link
///
/// UNB modules of the TD120x family ship configured for 9600 8N1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SerialConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baudrate: 9600,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopBits {
    One,
    Two,
}
