use crate::{BitLayout, Error, Result, SystemClock, TimeSource, UidConfig};
use parking_lot::Mutex;
use std::sync::Arc;

struct InlineState {
    seeded: bool,
    last_elapsed: u64,
    seq: u64,
}

/// A lock-guarded generator that mints IDs inline, without a ring buffer.
///
/// Simpler than [`CachedUidGenerator`] and strictly tied to the wall clock:
/// it never runs ahead of real time, so when the sequence space of the
/// current second is exhausted it spins until the clock advances. Suitable
/// for low-throughput callers that prefer timestamps matching the wall clock
/// over the cached generator's run-ahead behavior.
///
/// [`CachedUidGenerator`]: crate::CachedUidGenerator
pub struct BasicUidGenerator {
    bits: BitLayout,
    worker_id: u64,
    clock: Arc<dyn TimeSource>,
    state: Mutex<InlineState>,
}

impl BasicUidGenerator {
    /// Builds a generator for an already-assigned worker id, using a
    /// [`SystemClock`] anchored to the configured epoch.
    pub fn new(config: &UidConfig, worker_id: u64) -> Result<Self> {
        let clock = Arc::new(SystemClock::with_epoch(config.epoch));
        Self::with_clock(config, worker_id, clock)
    }

    /// Builds a generator with an explicit time source.
    pub fn with_clock(
        config: &UidConfig,
        worker_id: u64,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self> {
        let bits = config.validate()?;
        if worker_id > bits.max_worker_id() {
            return Err(Error::WorkerIdOverflow {
                worker_id,
                max: bits.max_worker_id(),
            });
        }
        Ok(Self {
            bits,
            worker_id,
            clock,
            state: Mutex::new(InlineState {
                seeded: false,
                last_elapsed: 0,
                seq: 0,
            }),
        })
    }

    /// Mints the next UID from the current wall clock.
    ///
    /// Spins briefly when the current second's sequence space is exhausted.
    /// Fails with [`Error::ClockRegression`] if the clock moves backward and
    /// with [`Error::EpochExhausted`] once the timestamp range is spent.
    pub fn next_id(&self) -> Result<i64> {
        let mut state = self.state.lock();
        let mut now = self.clock.current_secs();
        if now < state.last_elapsed {
            return Err(Error::ClockRegression {
                observed: now,
                last: state.last_elapsed,
            });
        }

        if state.seeded && now == state.last_elapsed {
            if state.seq < self.bits.max_sequence() {
                state.seq += 1;
            } else {
                // Sequence space spent; hold the lock and wait out the tick.
                while now <= state.last_elapsed {
                    core::hint::spin_loop();
                    now = self.clock.current_secs();
                }
                state.last_elapsed = now;
                state.seq = 0;
            }
        } else {
            state.seeded = true;
            state.last_elapsed = now;
            state.seq = 0;
        }

        self.bits.allocate(state.last_elapsed, self.worker_id, state.seq)
    }

    /// The worker id encoded into every UID this generator mints.
    pub fn worker_id(&self) -> u64 {
        self.worker_id
    }
}
