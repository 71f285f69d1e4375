use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Lek epoch: Thursday, January 1, 2015 00:00:00 UTC.
///
/// All timestamps embedded in a [`FlakeId`] are measured in milliseconds from
/// this instant. The 41-bit timestamp field covers roughly 69 years from here.
///
/// [`FlakeId`]: crate::FlakeId
pub const LEK_EPOCH: Duration = Duration::from_millis(1_420_041_600_000);

/// A trait for time sources that return the current timestamp.
///
/// This abstraction allows you to plug in the real system clock or a mocked
/// time source in tests.
///
/// The unit is **milliseconds** relative to a configurable origin (usually
/// [`LEK_EPOCH`]).
///
/// # Example
///
/// ```
/// use lekid::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current_millis(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since the configured epoch.
    fn current_millis(&self) -> u64;
}

/// A wall-clock time source that samples [`SystemTime::now`] on every call,
/// offset from a user-defined epoch.
///
/// This deliberately does **not** smooth over operating-system clock
/// adjustments: a backwards step (NTP correction, VM migration) is visible to
/// callers, which is what lets the allocator detect and reject clock rollback
/// instead of silently reissuing timestamps.
#[derive(Clone, Copy)]
pub struct WallClock {
    epoch_offset: u64, // in milliseconds
}

impl Default for WallClock {
    /// Constructs a wall clock aligned to [`LEK_EPOCH`].
    fn default() -> Self {
        Self::with_epoch(LEK_EPOCH)
    }
}

impl WallClock {
    /// Constructs a wall clock using a custom epoch as the origin (t = 0),
    /// specified as a [`Duration`] since 1970-01-01 UTC.
    ///
    /// The provided epoch defines the zero-point for all timestamps returned
    /// by this clock. Times earlier than the epoch saturate to zero.
    #[must_use]
    pub const fn with_epoch(epoch: Duration) -> Self {
        Self {
            epoch_offset: epoch.as_millis() as u64,
        }
    }
}

impl TimeSource for WallClock {
    /// Returns the number of milliseconds since the configured epoch based on
    /// the current system time.
    fn current_millis(&self) -> u64 {
        let unix_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_millis() as u64;
        unix_ms.saturating_sub(self.epoch_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_clock_is_past_epoch() {
        let clock = WallClock::default();
        let now = clock.current_millis();
        // 2020-01-01 relative to the 2015 epoch.
        assert!(now > 157_766_400_000);
    }

    #[test]
    fn wall_clock_epoch_offsets() {
        let unix = WallClock::with_epoch(Duration::ZERO);
        let lek = WallClock::default();
        let delta = unix.current_millis() - lek.current_millis();
        // Both samples happen within a few millis of each other.
        assert!(delta.abs_diff(LEK_EPOCH.as_millis() as u64) < 1_000);
    }
}
