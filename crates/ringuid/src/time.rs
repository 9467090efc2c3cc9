use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

/// Default epoch: Thursday, February 23, 2023 00:00:00 UTC.
///
/// With the default 28-bit timestamp field (seconds granularity) this epoch
/// supports roughly 8.7 years of generation.
pub const DEFAULT_EPOCH: Duration = Duration::from_secs(1_677_110_400);

/// A time source that reports elapsed whole seconds since a configured epoch.
///
/// This abstraction allows you to plug in the real system clock or a mocked
/// time source in tests. Seconds granularity is deliberate: the timestamp
/// field trades resolution for range, and the sequence field disambiguates
/// IDs minted within the same second.
///
/// # Example
///
/// ```
/// use ringuid::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_secs(&self) -> u64 {
///         1234
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current_secs(), 1234);
/// ```
pub trait TimeSource: Send + Sync {
    /// Returns the current time in whole seconds since the configured epoch.
    fn current_secs(&self) -> u64;
}

/// A [`TimeSource`] backed by [`SystemTime`], anchored to a custom epoch.
#[derive(Clone, Debug)]
pub struct SystemClock {
    epoch: Duration,
}

impl Default for SystemClock {
    /// Constructs a system clock aligned to [`DEFAULT_EPOCH`].
    fn default() -> Self {
        Self::with_epoch(DEFAULT_EPOCH)
    }
}

impl SystemClock {
    /// Constructs a system clock using a custom epoch as the origin (t = 0),
    /// specified as a [`Duration`] since 1970-01-01 UTC.
    ///
    /// # Panics
    ///
    /// Panics if the current system time is earlier than the given epoch.
    pub fn with_epoch(epoch: Duration) -> Self {
        let system_now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("System clock before UNIX_EPOCH");
        assert!(
            system_now >= epoch,
            "System clock before the configured epoch"
        );
        Self { epoch }
    }

    /// The epoch this clock is anchored to, as a duration since 1970-01-01 UTC.
    pub fn epoch(&self) -> Duration {
        self.epoch
    }
}

impl TimeSource for SystemClock {
    fn current_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("System clock before UNIX_EPOCH")
            .saturating_sub(self.epoch)
            .as_secs()
    }
}
