//! Error types for UID generation.
//!
//! The variants map onto the failure surfaces of the system:
//!
//! - `Config`: rejected at construction, before any ID is minted.
//! - `BufferEmpty`: the only error a foreground caller sees by default; raised
//!   when the ring buffer has been drained faster than padding refills it.
//! - `EpochExhausted` / `ClockRegression`: fatal to a padding pass. No valid
//!   ID can be minted past the epoch range, and reusing a past time unit
//!   would risk colliding with already-issued IDs.
//! - `IdentityPersistence`: local worker-id cache I/O failure. Non-fatal;
//!   assignment proceeds without reuse.
//! - `WorkerIdAssignment` / `WorkerIdOverflow`: startup-fatal identity
//!   failures from the slot store or an oversized assigned id.

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the UID generation system.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A configuration value was rejected at construction.
    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    /// The ring buffer is empty and the take-reject policy surfaced the
    /// exhaustion to the caller.
    #[error("ring buffer exhausted: no cached UID available")]
    BufferEmpty,

    /// The elapsed time no longer fits in the timestamp field. No further IDs
    /// can be minted with this layout and epoch.
    #[error("epoch exhausted: elapsed {elapsed}s exceeds the {max}s timestamp range")]
    EpochExhausted { elapsed: u64, max: u64 },

    /// The wall clock moved backward relative to the last observed reading.
    #[error("clock moved backwards: observed {observed}s after {last}s")]
    ClockRegression { observed: u64, last: u64 },

    /// Reading or writing the local worker-id cache failed.
    #[error("worker identity cache I/O failure")]
    IdentityPersistence(#[from] std::io::Error),

    /// The worker slot store failed to assign an id.
    #[error("worker id assignment failed: {reason}")]
    WorkerIdAssignment { reason: String },

    /// The assigned worker id does not fit in the configured bit width.
    #[error("worker id {worker_id} exceeds the maximum {max} for this layout")]
    WorkerIdOverflow { worker_id: u64, max: u64 },
}
