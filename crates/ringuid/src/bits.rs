use crate::{Error, Result};
use core::fmt;

/// Total number of bits in a UID, including the reserved sign bit.
pub const TOTAL_BITS: u32 = 64;

/// The decoded fields of a UID.
///
/// Produced by [`BitLayout::deallocate`]; used for diagnostics and testing
/// only. IDs are compared and stored as raw `i64` values.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UidParts {
    /// Elapsed time units (seconds) since the configured epoch.
    pub elapsed: u64,
    /// The worker slot identifier encoded into the ID.
    pub worker_id: u64,
    /// The per-second sequence counter.
    pub seq: u64,
}

/// The validated bit layout of a UID and its field packing rules.
///
/// A UID is a signed 64-bit integer laid out most-significant to
/// least-significant as:
///
/// ```text
///  Bit Index:  63            62 .. (62-t+1)      ..                 .. 0
///              +--------------+------------------+------------+----------+
///  Field:      | reserved (1) | elapsed secs (t) | worker (w) | seq (s)  |
///              +--------------+------------------+------------+----------+
/// ```
///
/// where `1 + t + w + s == 64`. The sign bit is always zero, so every UID is
/// non-negative.
///
/// # Example
///
/// ```
/// use ringuid::BitLayout;
///
/// let bits = BitLayout::new(28, 22, 13).unwrap();
/// let uid = bits.allocate(1000, 5, 7).unwrap();
/// let parts = bits.deallocate(uid);
/// assert_eq!((parts.elapsed, parts.worker_id, parts.seq), (1000, 5, 7));
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BitLayout {
    time_bits: u32,
    worker_bits: u32,
    seq_bits: u32,

    max_elapsed: u64,
    max_worker_id: u64,
    max_sequence: u64,

    timestamp_shift: u32,
    worker_shift: u32,
}

impl BitLayout {
    /// Builds a layout from the three field widths.
    ///
    /// Fails with [`Error::Config`] unless `1 + time_bits + worker_bits +
    /// seq_bits == 64` and every width is non-zero.
    pub fn new(time_bits: u32, worker_bits: u32, seq_bits: u32) -> Result<Self> {
        if time_bits == 0 || worker_bits == 0 || seq_bits == 0 {
            return Err(Error::Config {
                reason: format!(
                    "bit widths must be non-zero, got time={time_bits} worker={worker_bits} seq={seq_bits}"
                ),
            });
        }
        let used = 1 + time_bits + worker_bits + seq_bits;
        if used != TOTAL_BITS {
            return Err(Error::Config {
                reason: format!(
                    "bit widths must sum to {} including the sign bit, got {used}",
                    TOTAL_BITS
                ),
            });
        }

        Ok(Self {
            time_bits,
            worker_bits,
            seq_bits,
            max_elapsed: bit_max(time_bits),
            max_worker_id: bit_max(worker_bits),
            max_sequence: bit_max(seq_bits),
            timestamp_shift: worker_bits + seq_bits,
            worker_shift: seq_bits,
        })
    }

    /// Packs `(elapsed, worker_id, seq)` into a UID.
    ///
    /// `worker_id` out of range is rejected with [`Error::WorkerIdOverflow`].
    /// `elapsed` out of range is rejected with [`Error::EpochExhausted`]: the
    /// timestamp field is the one field that must never be silently masked,
    /// since wrapping it would restart the ID space from the epoch.
    pub fn allocate(&self, elapsed: u64, worker_id: u64, seq: u64) -> Result<i64> {
        if elapsed > self.max_elapsed {
            return Err(Error::EpochExhausted {
                elapsed,
                max: self.max_elapsed,
            });
        }
        if worker_id > self.max_worker_id {
            return Err(Error::WorkerIdOverflow {
                worker_id,
                max: self.max_worker_id,
            });
        }
        debug_assert!(seq <= self.max_sequence, "sequence out of range: {seq}");
        let seq = seq & self.max_sequence;

        let raw =
            (elapsed << self.timestamp_shift) | (worker_id << self.worker_shift) | seq;
        Ok(raw as i64)
    }

    /// Unpacks a UID into its fields. Exact inverse of [`Self::allocate`].
    pub fn deallocate(&self, uid: i64) -> UidParts {
        let raw = uid as u64;
        UidParts {
            elapsed: (raw >> self.timestamp_shift) & self.max_elapsed,
            worker_id: (raw >> self.worker_shift) & self.max_worker_id,
            seq: raw & self.max_sequence,
        }
    }

    /// Width of the timestamp field, in bits.
    pub const fn time_bits(&self) -> u32 {
        self.time_bits
    }

    /// Width of the worker-id field, in bits.
    pub const fn worker_bits(&self) -> u32 {
        self.worker_bits
    }

    /// Width of the sequence field, in bits.
    pub const fn seq_bits(&self) -> u32 {
        self.seq_bits
    }

    /// Maximum encodable elapsed value (`2^time_bits - 1`).
    pub const fn max_elapsed(&self) -> u64 {
        self.max_elapsed
    }

    /// Maximum encodable worker id (`2^worker_bits - 1`).
    pub const fn max_worker_id(&self) -> u64 {
        self.max_worker_id
    }

    /// Maximum encodable sequence value (`2^seq_bits - 1`).
    pub const fn max_sequence(&self) -> u64 {
        self.max_sequence
    }
}

impl fmt::Display for BitLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"timeBits\":{},\"workerBits\":{},\"seqBits\":{}}}",
            self.time_bits, self.worker_bits, self.seq_bits
        )
    }
}

const fn bit_max(bits: u32) -> u64 {
    (1_u64 << bits) - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_layout() -> BitLayout {
        BitLayout::new(28, 22, 13).unwrap()
    }

    #[test]
    fn round_trips_across_field_ranges() {
        let bits = default_layout();
        let samples = [
            (0, 0, 0),
            (1, 1, 1),
            (bits.max_elapsed(), bits.max_worker_id(), bits.max_sequence()),
            (12_345, 42, 8_000),
            (bits.max_elapsed(), 0, 0),
            (0, bits.max_worker_id(), 0),
            (0, 0, bits.max_sequence()),
        ];
        for (elapsed, worker_id, seq) in samples {
            let uid = bits.allocate(elapsed, worker_id, seq).unwrap();
            assert!(uid >= 0, "sign bit must stay clear");
            let parts = bits.deallocate(uid);
            assert_eq!(parts, UidParts { elapsed, worker_id, seq });
        }
    }

    #[test]
    fn epoch_instant_worker_five_first_sequence() {
        // Worked example: at exactly the epoch instant, worker id 5, first
        // sequence value.
        let bits = default_layout();
        let uid = bits.allocate(0, 5, 0).unwrap();
        let parts = bits.deallocate(uid);
        assert_eq!(parts.elapsed, 0);
        assert_eq!(parts.worker_id, 5);
        assert_eq!(parts.seq, 0);
    }

    #[test]
    fn elapsed_overflow_is_epoch_exhaustion() {
        let bits = default_layout();
        let err = bits.allocate(bits.max_elapsed() + 1, 0, 0).unwrap_err();
        assert!(matches!(err, Error::EpochExhausted { .. }));
    }

    #[test]
    fn worker_id_overflow_is_rejected() {
        let bits = default_layout();
        let err = bits.allocate(0, bits.max_worker_id() + 1, 0).unwrap_err();
        assert!(matches!(err, Error::WorkerIdOverflow { .. }));
    }

    #[test]
    fn invalid_width_sum_is_rejected() {
        assert!(matches!(
            BitLayout::new(28, 22, 14),
            Err(Error::Config { .. })
        ));
        assert!(matches!(BitLayout::new(0, 30, 33), Err(Error::Config { .. })));
    }

    #[test]
    fn ids_order_by_time_then_sequence() {
        let bits = default_layout();
        let a = bits.allocate(10, 3, 5).unwrap();
        let b = bits.allocate(10, 3, 6).unwrap();
        let c = bits.allocate(11, 3, 0).unwrap();
        assert!(a < b && b < c);
    }
}
