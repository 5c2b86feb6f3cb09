//! Time and liveness abstractions

/// Monotonic millisecond clock
///
/// The counter is allowed to wrap at `u32::MAX`; consumers compare
/// timestamps with wrapping arithmetic.
pub trait Clock {
    /// Current time in milliseconds
    fn now_ms(&self) -> u32;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

/// Liveness tick for platforms with a hardware watchdog
///
/// Poll loops call [`feed`](Self::feed) on every iteration, so the
/// interval between feeds stays bounded no matter how long the overall
/// wait is.
pub trait Watchdog {
    /// Reset the watchdog countdown
    fn feed(&mut self);
}

/// Watchdog for platforms without one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoWatchdog;

impl Watchdog for NoWatchdog {
    fn feed(&mut self) {}
}

impl<T: Watchdog + ?Sized> Watchdog for &mut T {
    fn feed(&mut self) {
        (**self).feed()
    }
}
