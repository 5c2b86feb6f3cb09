//! Deterministic simulation of a modem link
//!
//! A [`SimTime`] cell is shared by a scripted channel, a clock, a delay and
//! a watchdog. Every clock read advances time by one millisecond, so a
//! busy-polling reader makes progress through the script exactly as it
//! would against a real UART, without any real waiting.
//!
//! ```text
//! script: [(0, b"garbage"), (120, b"8622\r\n"), (130, b"OK\r\n")]
//!           │                 │
//!           │                 └─ readable once time >= 120 ms
//!           └─ readable immediately
//! ```

use core::cell::Cell;

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use crate::channel::ByteChannel;
use crate::time::{Clock, Watchdog};

/// Maximum number of bytes the scripted channel records as written
pub const SIM_TX_CAPACITY: usize = 512;

/// Shared simulated time in milliseconds
#[derive(Debug, Default)]
pub struct SimTime {
    now: Cell<u32>,
}

impl SimTime {
    /// Start the simulation at `start_ms`
    pub const fn new(start_ms: u32) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    /// Current simulated time
    pub fn now(&self) -> u32 {
        self.now.get()
    }

    /// Move time forward
    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }

    /// Clock reading from this time base
    pub fn clock(&self) -> SimClock<'_> {
        SimClock { time: self }
    }

    /// Delay provider on this time base
    pub fn delay(&self) -> SimDelay<'_> {
        SimDelay {
            time: self,
            total_ms: 0,
        }
    }

    /// Watchdog recording feed intervals on this time base
    pub fn watchdog(&self) -> SimWatchdog<'_> {
        SimWatchdog {
            time: self,
            feeds: 0,
            last_feed_ms: None,
            max_gap_ms: 0,
        }
    }

    /// Channel replaying `script` on this time base
    pub fn channel<'t>(&'t self, script: &'t [(u32, &'t [u8])]) -> ScriptedChannel<'t> {
        ScriptedChannel {
            time: self,
            script,
            chunk: 0,
            offset: 0,
            consumed: 0,
            written: Vec::new(),
        }
    }
}

/// Clock that advances the simulation by 1 ms per reading
#[derive(Debug, Clone, Copy)]
pub struct SimClock<'t> {
    time: &'t SimTime,
}

impl Clock for SimClock<'_> {
    fn now_ms(&self) -> u32 {
        let now = self.time.now();
        self.time.advance(1);
        now
    }
}

/// Delay that advances the simulation instead of sleeping
#[derive(Debug)]
pub struct SimDelay<'t> {
    time: &'t SimTime,
    total_ms: u32,
}

impl SimDelay<'_> {
    /// Total milliseconds spent delaying
    pub fn total_ms(&self) -> u32 {
        self.total_ms
    }

    fn spend(&mut self, ms: u32) {
        self.time.advance(ms);
        self.total_ms = self.total_ms.wrapping_add(ms);
    }
}

impl DelayNs for SimDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.spend(ns.div_ceil(1_000_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.spend(us.div_ceil(1_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.spend(ms);
    }
}

/// Watchdog that records how often it was fed
#[derive(Debug)]
pub struct SimWatchdog<'t> {
    time: &'t SimTime,
    feeds: u32,
    last_feed_ms: Option<u32>,
    max_gap_ms: u32,
}

impl SimWatchdog<'_> {
    /// Number of feeds so far
    pub fn feeds(&self) -> u32 {
        self.feeds
    }

    /// Longest interval observed between two consecutive feeds
    pub fn max_gap_ms(&self) -> u32 {
        self.max_gap_ms
    }
}

impl Watchdog for SimWatchdog<'_> {
    fn feed(&mut self) {
        let now = self.time.now();
        if let Some(last) = self.last_feed_ms {
            self.max_gap_ms = self.max_gap_ms.max(now.wrapping_sub(last));
        }
        self.last_feed_ms = Some(now);
        self.feeds += 1;
    }
}

/// Channel that releases scripted bytes at scripted times
///
/// Each script entry `(at_ms, bytes)` becomes readable once simulated time
/// reaches `at_ms`. Entries are delivered strictly in order.
#[derive(Debug)]
pub struct ScriptedChannel<'t> {
    time: &'t SimTime,
    script: &'t [(u32, &'t [u8])],
    chunk: usize,
    offset: usize,
    consumed: usize,
    written: Vec<u8, SIM_TX_CAPACITY>,
}

impl ScriptedChannel<'_> {
    /// Bytes written by the engine so far
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Number of times `pattern` occurs in the written bytes
    pub fn count_written(&self, pattern: &[u8]) -> usize {
        if pattern.is_empty() {
            return 0;
        }
        self.written
            .windows(pattern.len())
            .filter(|window| *window == pattern)
            .count()
    }

    /// Number of scripted bytes consumed by reads
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Number of scripted bytes not yet consumed, released or not
    pub fn pending(&self) -> usize {
        let total: usize = self.script.iter().map(|(_, bytes)| bytes.len()).sum();
        total - self.consumed
    }

    fn available(&mut self) -> Option<u8> {
        while let Some(&(at_ms, bytes)) = self.script.get(self.chunk) {
            if self.offset >= bytes.len() {
                self.chunk += 1;
                self.offset = 0;
                continue;
            }
            if (self.time.now().wrapping_sub(at_ms) as i32) < 0 {
                return None;
            }
            return Some(bytes[self.offset]);
        }
        None
    }
}

impl ByteChannel for ScriptedChannel<'_> {
    fn try_read_byte(&mut self) -> Option<u8> {
        let byte = self.available()?;
        self.offset += 1;
        self.consumed += 1;
        Some(byte)
    }

    fn peek_byte(&mut self) -> Option<u8> {
        self.available()
    }

    fn write(&mut self, data: &[u8]) {
        for &byte in data {
            // Overflow is dropped; tests never exceed the capacity
            let _ = self.written.push(byte);
        }
    }
}
