use crate::{BitLayout, Error, PutRejectPolicy, Result, RingBuffer, TimeSource};
use core::time::Duration;
use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread::{self, JoinHandle};

/// Monotonic `(elapsed, seq)` allocation state for the padding task.
///
/// Seeded from the wall clock on first use and advanced pair-by-pair from
/// then on. The state is allowed to run ahead of the wall clock: when the
/// sequence space for the current time unit is exhausted, production moves to
/// the next unit rather than waiting for the clock, which is what keeps UIDs
/// unique even when the clock appears to stand still.
pub(crate) struct SequenceState {
    seeded: bool,
    /// Time unit of the last produced pair. May be ahead of the wall clock.
    elapsed: u64,
    seq: u64,
    /// Highest wall-clock reading ever observed. Regression is checked
    /// against this rather than `elapsed`, since `elapsed` legitimately runs
    /// ahead and would mask a real backward step.
    last_observed: u64,
}

impl SequenceState {
    pub(crate) fn new() -> Self {
        Self {
            seeded: false,
            elapsed: 0,
            seq: 0,
            last_observed: 0,
        }
    }

    /// Produces the next `(elapsed, seq)` pair given the current wall-clock
    /// reading.
    ///
    /// Fails with [`Error::ClockRegression`] when `now` moves backward, and
    /// with [`Error::EpochExhausted`] once the timestamp field overflows.
    /// Neither condition is recoverable within this pass: reusing a past time
    /// unit could collide with IDs already issued.
    pub(crate) fn next_pair(&mut self, now: u64, bits: &BitLayout) -> Result<(u64, u64)> {
        if now < self.last_observed {
            return Err(Error::ClockRegression {
                observed: now,
                last: self.last_observed,
            });
        }
        self.last_observed = now;

        if !self.seeded {
            self.seeded = true;
            self.elapsed = now;
            self.seq = 0;
        } else if now > self.elapsed {
            self.elapsed = now;
            self.seq = 0;
        } else if self.seq < bits.max_sequence() {
            self.seq += 1;
        } else {
            self.elapsed += 1;
            self.seq = 0;
        }

        if self.elapsed > bits.max_elapsed() {
            return Err(Error::EpochExhausted {
                elapsed: self.elapsed,
                max: bits.max_elapsed(),
            });
        }
        Ok((self.elapsed, self.seq))
    }
}

/// Refills consumed ring-buffer slots with freshly minted UIDs.
///
/// At most one padding pass runs at a time: the single-flight guard turns
/// every concurrent trigger into a no-op while a pass is in flight, so the
/// level-triggered occupancy signal from racing takers never stacks up
/// redundant passes (which would waste sequence space).
pub struct PaddingExecutor {
    buffer: Arc<RingBuffer>,
    bits: BitLayout,
    worker_id: u64,
    clock: Arc<dyn TimeSource>,
    state: Mutex<SequenceState>,
    running: AtomicBool,
    put_policy: Arc<dyn PutRejectPolicy>,
}

impl PaddingExecutor {
    pub fn new(
        buffer: Arc<RingBuffer>,
        bits: BitLayout,
        worker_id: u64,
        clock: Arc<dyn TimeSource>,
        put_policy: Arc<dyn PutRejectPolicy>,
    ) -> Self {
        Self {
            buffer,
            bits,
            worker_id,
            clock,
            state: Mutex::new(SequenceState::new()),
            running: AtomicBool::new(false),
            put_policy,
        }
    }

    /// Runs a padding pass on the calling thread.
    ///
    /// Returns immediately with `Ok(())` if another pass is already in
    /// flight. Otherwise fills the buffer until it is full (or a put is
    /// rejected), and propagates [`Error::ClockRegression`] /
    /// [`Error::EpochExhausted`], which abort the pass.
    pub fn pad_to_full(&self) -> Result<()> {
        if !self.try_begin() {
            tracing::trace!("padding pass already in flight; coalescing");
            return Ok(());
        }
        let result = self.fill();
        self.end();
        if let Err(ref err) = result {
            tracing::error!(%err, "padding pass aborted");
        }
        result
    }

    /// Schedules a padding pass on a background thread.
    ///
    /// No-op when a pass is already in flight. Errors inside the background
    /// pass are logged; they never reach a foreground caller.
    pub fn trigger(self: &Arc<Self>) {
        if !self.try_begin() {
            return;
        }
        let this = Arc::clone(self);
        thread::spawn(move || {
            let result = this.fill();
            this.end();
            if let Err(err) = result {
                tracing::error!(%err, "async padding pass aborted");
            }
        });
    }

    fn try_begin(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn end(&self) {
        self.running.store(false, Ordering::Release);
    }

    fn fill(&self) -> Result<()> {
        let mut produced: u64 = 0;
        let mut state = self.state.lock();
        loop {
            // Don't mint into a full buffer: the sequence space spent on a
            // value that try_put rejects is gone for good.
            if self.buffer.is_full() {
                break;
            }
            let now = self.clock.current_secs();
            let (elapsed, seq) = state.next_pair(now, &self.bits)?;
            let uid = self.bits.allocate(elapsed, self.worker_id, seq)?;
            if !self.buffer.try_put(uid) {
                self.put_policy.on_full(uid);
                break;
            }
            produced += 1;
        }
        tracing::debug!(produced, occupancy = self.buffer.occupancy(), "padding pass complete");
        Ok(())
    }
}

/// Fixed-period forced refill.
///
/// Covers bursty call patterns where the occupancy threshold alone would
/// under-fill between bursts. The thread parks between passes and is woken
/// for prompt shutdown when the scheduler is dropped.
pub struct PaddingScheduler {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PaddingScheduler {
    pub fn start(padding: Arc<PaddingExecutor>, interval: Duration) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let handle = thread::spawn(move || {
            tracing::debug!(?interval, "padding scheduler started");
            loop {
                thread::park_timeout(interval);
                if flag.load(Ordering::Acquire) {
                    break;
                }
                if let Err(err) = padding.pad_to_full() {
                    tracing::error!(%err, "scheduled padding pass failed");
                }
            }
            tracing::debug!("padding scheduler stopped");
        });
        Self {
            shutdown,
            handle: Some(handle),
        }
    }
}

impl Drop for PaddingScheduler {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            let _ = handle.join();
        }
    }
}
