//! Absolute deadlines on a wrapping millisecond clock

/// Point in time after which a wait gives up
///
/// Computed once as "now + timeout" and passed down unchanged, so the total
/// time an operation may take is bounded regardless of how many lines it
/// reads. Comparison uses wrapping arithmetic: a deadline stays valid across
/// the `u32` millisecond counter rolling over, as long as it lies less than
/// ~24 days in the future.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Deadline(u32);

impl Deadline {
    /// Deadline at an absolute clock value
    pub const fn at(instant_ms: u32) -> Self {
        Self(instant_ms)
    }

    /// Deadline `timeout_ms` after `now_ms`
    pub const fn after(now_ms: u32, timeout_ms: u32) -> Self {
        Self(now_ms.wrapping_add(timeout_ms))
    }

    /// Absolute clock value of this deadline
    pub const fn instant_ms(self) -> u32 {
        self.0
    }

    /// Check whether `now_ms` is at or past the deadline
    pub const fn is_expired(self, now_ms: u32) -> bool {
        now_ms.wrapping_sub(self.0) as i32 >= 0
    }
}
