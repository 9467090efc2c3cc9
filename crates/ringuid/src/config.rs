use crate::{BitLayout, DEFAULT_EPOCH, Error, Result};
use core::time::Duration;

/// Default occupancy percentage below which a refill is triggered.
pub const DEFAULT_PADDING_FACTOR: u32 = 50;

/// Default ring-buffer boost exponent. With the default 13 sequence bits the
/// buffer holds `8192 << 3 = 65536` pre-computed IDs.
pub const DEFAULT_BOOST_POWER: u32 = 3;

/// Configuration for a UID generator.
///
/// Defaults mirror the reference deployment: 28 timestamp bits (seconds,
/// ~8.7 years of range), 22 worker bits (~4.2M process starts with disposable
/// assignment), 13 sequence bits (8192 IDs per second per worker), epoch
/// 2023-02-23.
///
/// Applications with low concurrency that want a longer lifespan should grow
/// `time_bits` at the expense of `seq_bits`; applications that restart
/// frequently should grow `worker_bits` instead.
///
/// # Example
///
/// ```
/// use ringuid::UidConfig;
///
/// let config = UidConfig::default()
///     .boost_power(2)
///     .padding_factor(60)
///     .reusable(false);
/// assert!(config.validate().is_ok());
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UidConfig {
    /// Width of the timestamp field, in bits.
    pub time_bits: u32,
    /// Width of the worker-id field, in bits.
    pub worker_bits: u32,
    /// Width of the sequence field, in bits.
    pub seq_bits: u32,
    /// The instant used as timestamp zero, as a duration since 1970-01-01 UTC.
    pub epoch: Duration,
    /// Ring-buffer capacity exponent: `buffer_size = 2^seq_bits << boost_power`.
    pub boost_power: u32,
    /// Occupancy percentage floor that triggers an asynchronous refill.
    /// Valid range is `(0, 100)` exclusive.
    pub padding_factor: u32,
    /// Optional fixed-period forced refill. `None` disables the scheduler.
    pub schedule_interval: Option<Duration>,
    /// Whether a previously assigned worker id may be reclaimed from the
    /// local identity cache on restart.
    pub reusable: bool,
}

impl Default for UidConfig {
    fn default() -> Self {
        Self {
            time_bits: 28,
            worker_bits: 22,
            seq_bits: 13,
            epoch: DEFAULT_EPOCH,
            boost_power: DEFAULT_BOOST_POWER,
            padding_factor: DEFAULT_PADDING_FACTOR,
            schedule_interval: None,
            reusable: true,
        }
    }
}

impl UidConfig {
    /// Sets the timestamp field width.
    pub fn time_bits(mut self, bits: u32) -> Self {
        self.time_bits = bits;
        self
    }

    /// Sets the worker-id field width.
    pub fn worker_bits(mut self, bits: u32) -> Self {
        self.worker_bits = bits;
        self
    }

    /// Sets the sequence field width.
    pub fn seq_bits(mut self, bits: u32) -> Self {
        self.seq_bits = bits;
        self
    }

    /// Sets the epoch instant, as a duration since 1970-01-01 UTC.
    pub fn epoch(mut self, epoch: Duration) -> Self {
        self.epoch = epoch;
        self
    }

    /// Sets the ring-buffer boost exponent.
    pub fn boost_power(mut self, power: u32) -> Self {
        self.boost_power = power;
        self
    }

    /// Sets the refill-trigger occupancy percentage.
    pub fn padding_factor(mut self, percent: u32) -> Self {
        self.padding_factor = percent;
        self
    }

    /// Enables periodic forced refill with the given period. An interval of
    /// zero seconds disables the scheduler.
    pub fn schedule_interval(mut self, interval: Duration) -> Self {
        self.schedule_interval = (!interval.is_zero()).then_some(interval);
        self
    }

    /// Enables or disables worker-id reuse across restarts.
    pub fn reusable(mut self, reusable: bool) -> Self {
        self.reusable = reusable;
        self
    }

    /// Validates the configuration and builds the [`BitLayout`].
    ///
    /// Fails with [`Error::Config`] on an invalid bit-width sum, an
    /// out-of-range padding factor, or a buffer size that overflows `u64`.
    pub fn validate(&self) -> Result<BitLayout> {
        let layout = BitLayout::new(self.time_bits, self.worker_bits, self.seq_bits)?;
        if self.padding_factor == 0 || self.padding_factor >= 100 {
            return Err(Error::Config {
                reason: format!(
                    "padding factor must be in (0, 100), got {}",
                    self.padding_factor
                ),
            });
        }
        // seq_bits + boost_power must leave the capacity representable.
        if self.seq_bits + self.boost_power >= 63 {
            return Err(Error::Config {
                reason: format!(
                    "boost power {} is too large for {} sequence bits",
                    self.boost_power, self.seq_bits
                ),
            });
        }
        Ok(layout)
    }

    /// The ring-buffer capacity implied by this configuration.
    pub fn buffer_size(&self) -> u64 {
        (1_u64 << self.seq_bits) << self.boost_power
    }
}
