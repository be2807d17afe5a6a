use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Default epoch: Friday, August 5, 2022 04:34:00 UTC.
///
/// Subtracting a recent fixed epoch from wall-clock readings keeps the
/// 41-bit timestamp field small and delays its overflow (roughly 69 years
/// of room from this origin).
pub const FLOE_EPOCH: Duration = Duration::from_millis(1_659_674_040_000);

/// A source of millisecond timestamps relative to a configured epoch.
///
/// This abstraction lets the generator consume the real wall clock in
/// production ([`WallClock`]) and an injected clock in tests, where
/// regression and sequence-exhaustion behavior must be exercised
/// deterministically.
///
/// # Example
///
/// ```
/// use floe::TimeSource;
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
    /// Returns the current time in whole milliseconds since the configured
    /// epoch.
    fn current_millis(&self) -> u64;
}

/// A time source that reads the system wall clock on every call.
///
/// Readings are returned as milliseconds elapsed since the epoch the clock
/// was constructed with. The raw wall clock is read each time rather than a
/// monotonic timer: the generator's contract is to *observe* clock
/// regressions (NTP steps, manual adjustment) and surface them as
/// [`Error::ClockRegression`], which a monotonized source would mask.
///
/// Readings earlier than the configured epoch saturate to zero.
///
/// [`Error::ClockRegression`]: crate::Error::ClockRegression
#[derive(Clone, Debug)]
pub struct WallClock {
    epoch_millis: u64,
}

impl Default for WallClock {
    /// Constructs a wall clock aligned to [`FLOE_EPOCH`].
    fn default() -> Self {
        Self::with_epoch(FLOE_EPOCH)
    }
}

impl WallClock {
    /// Constructs a wall clock using a custom epoch as its origin (t = 0),
    /// given as a [`Duration`] since 1970-01-01 UTC.
    ///
    /// All IDs that should ever be compared with each other must come from
    /// generators sharing one epoch.
    pub fn with_epoch(epoch: Duration) -> Self {
        Self {
            epoch_millis: epoch.as_millis() as u64,
        }
    }
}

impl TimeSource for WallClock {
    /// Returns the number of milliseconds between the configured epoch and
    /// the current system time.
    ///
    /// # Panics
    ///
    /// Panics if the system clock reads earlier than the Unix epoch.
    fn current_millis(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before Unix epoch")
            .as_millis() as u64;
        now.saturating_sub(self.epoch_millis)
    }
}
