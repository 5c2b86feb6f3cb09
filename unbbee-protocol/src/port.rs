//! Engine context
//!
//! [`AtPort`] owns everything one modem link needs: the borrowed byte
//! channel, the clock, delay and watchdog handles, the diagnostic sink and
//! the line buffer. The line reader, command framer and response
//! interpreter are all methods on it, so there is exactly one engine per
//! channel and no process-wide state.

use embedded_hal::delay::DelayNs;
use unbbee_hal::{Clock, NoWatchdog, Watchdog};

use crate::deadline::Deadline;
use crate::diag::NoDiag;
use crate::line::LineBuffer;

/// Longest single delay slice between watchdog feeds
pub const WATCHDOG_SLICE_MS: u32 = 10;

/// AT protocol engine bound to one byte channel
pub struct AtPort<'a, C, K, D, W = NoWatchdog, G = NoDiag> {
    pub(crate) channel: &'a mut C,
    pub(crate) clock: K,
    pub(crate) delay: D,
    pub(crate) watchdog: W,
    pub(crate) diag: G,
    pub(crate) line: LineBuffer,
}

impl<'a, C, K, D> AtPort<'a, C, K, D> {
    /// Create an engine on `channel` without watchdog or diagnostics
    pub fn new(channel: &'a mut C, clock: K, delay: D) -> Self {
        Self {
            channel,
            clock,
            delay,
            watchdog: NoWatchdog,
            diag: NoDiag,
            line: LineBuffer::new(),
        }
    }
}

impl<'a, C, K, D, W, G> AtPort<'a, C, K, D, W, G> {
    /// Attach a watchdog fed from every poll loop
    pub fn with_watchdog<W2>(self, watchdog: W2) -> AtPort<'a, C, K, D, W2, G> {
        AtPort {
            channel: self.channel,
            clock: self.clock,
            delay: self.delay,
            watchdog,
            diag: self.diag,
            line: self.line,
        }
    }

    /// Attach a diagnostic sink receiving the raw transcript
    pub fn with_diag<G2>(self, diag: G2) -> AtPort<'a, C, K, D, W, G2> {
        AtPort {
            channel: self.channel,
            clock: self.clock,
            delay: self.delay,
            watchdog: self.watchdog,
            diag,
            line: self.line,
        }
    }

    /// Replace the diagnostic sink
    ///
    /// With `G = Option<S>` this switches diagnostics on and off at runtime.
    pub fn set_diag(&mut self, diag: G) {
        self.diag = diag;
    }

    /// Get access to the diagnostic sink
    pub fn diag(&self) -> &G {
        &self.diag
    }

    /// Get access to the watchdog
    pub fn watchdog(&self) -> &W {
        &self.watchdog
    }

    /// Get access to the byte channel
    pub fn channel(&self) -> &C {
        &*self.channel
    }

    /// The most recently read line
    pub fn line(&self) -> &LineBuffer {
        &self.line
    }

    /// Tear down the engine and hand back its parts
    pub fn release(self) -> (&'a mut C, K, D, W, G) {
        (self.channel, self.clock, self.delay, self.watchdog, self.diag)
    }
}

impl<C, K: Clock, D, W, G> AtPort<'_, C, K, D, W, G> {
    /// Current clock value
    pub fn now_ms(&self) -> u32 {
        self.clock.now_ms()
    }

    /// Deadline `timeout_ms` from now
    pub fn deadline_in(&self, timeout_ms: u32) -> Deadline {
        Deadline::after(self.clock.now_ms(), timeout_ms)
    }

    pub(crate) fn is_expired(&self, deadline: Deadline) -> bool {
        deadline.is_expired(self.clock.now_ms())
    }
}

impl<C, K, D: DelayNs, W: Watchdog, G> AtPort<'_, C, K, D, W, G> {
    /// Delay for `ms` milliseconds, feeding the watchdog every slice
    ///
    /// The watchdog is fed on return as well, so callers start their next
    /// poll loop with a full slice of headroom.
    pub fn pause(&mut self, ms: u32) {
        let mut remaining = ms;
        while remaining > WATCHDOG_SLICE_MS {
            self.watchdog.feed();
            self.delay.delay_ms(WATCHDOG_SLICE_MS);
            remaining -= WATCHDOG_SLICE_MS;
        }
        self.watchdog.feed();
        self.delay.delay_ms(remaining);
        self.watchdog.feed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unbbee_hal::sim::SimTime;

    #[test]
    fn test_pause_feeds_watchdog_per_slice() {
        let time = SimTime::new(0);
        let mut channel = time.channel(&[]);
        let mut port =
            AtPort::new(&mut channel, time.clock(), time.delay()).with_watchdog(time.watchdog());

        port.pause(95);

        assert_eq!(time.now(), 95);
        // 9 full slices, the 5 ms remainder, and one feed on return
        assert_eq!(port.watchdog().feeds(), 11);
        assert_eq!(port.watchdog().max_gap_ms(), WATCHDOG_SLICE_MS);
    }

    #[test]
    fn test_deadline_in() {
        let time = SimTime::new(500);
        let mut channel = time.channel(&[]);
        let port = AtPort::new(&mut channel, time.clock(), time.delay());

        let deadline = port.deadline_in(2000);
        assert_eq!(deadline.instant_ms(), 2500);
    }

    #[test]
    fn test_release_returns_parts() {
        let time = SimTime::new(0);
        let mut channel = time.channel(&[]);
        let port = AtPort::new(&mut channel, time.clock(), time.delay()).with_diag(Some(NoDiag));

        let (_channel, _clock, delay, _watchdog, diag) = port.release();
        assert_eq!(delay.total_ms(), 0);
        assert_eq!(diag, Some(NoDiag));
    }
}
