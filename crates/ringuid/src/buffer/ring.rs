use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU64, Ordering};

/// Slot is free and may be written by the padding producer.
const CAN_PUT: u32 = 0;
/// Slot holds a published UID and may be consumed.
const CAN_TAKE: u32 = 1;

/// One pre-computed UID plus its publication flag.
///
/// The payload is only considered readable once the flag has been flipped to
/// `CAN_TAKE` with release ordering, so a consumer that observes the flag
/// also observes the payload written before it.
struct Slot {
    flag: AtomicU32,
    value: AtomicI64,
}

impl Slot {
    fn new() -> Self {
        Self {
            flag: AtomicU32::new(CAN_PUT),
            value: AtomicI64::new(0),
        }
    }
}

/// A fixed-capacity circular array of pre-computed UIDs.
///
/// Production and consumption are decoupled through two monotonically
/// increasing `u64` counters:
///
/// - `tail`: number of UIDs produced. Written only by the padding task, which
///   holds the single-flight guard, so there is exactly one producer.
/// - `cursor`: number of UIDs consumed. Advanced by CAS, so any number of
///   foreground threads may race on takes.
///
/// Counters wrap to a slot index with `counter & (capacity - 1)`; capacity is
/// required to be a power of two. The buffer is logically full when
/// `tail - cursor == capacity` and empty when `tail == cursor`, which keeps
/// the invariant `0 <= tail - cursor <= capacity` without any modular
/// arithmetic on the counters themselves.
///
/// Neither [`try_put`] nor [`try_take`] ever blocks.
///
/// [`try_put`]: Self::try_put
/// [`try_take`]: Self::try_take
pub struct RingBuffer {
    slots: Box<[Slot]>,
    mask: u64,
    /// Produced count. Single writer (the padding task).
    tail: CachePadded<AtomicU64>,
    /// Consumed count. Many racing writers.
    cursor: CachePadded<AtomicU64>,
}

impl RingBuffer {
    /// Creates a buffer with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or not a power of two. Capacities are
    /// derived from a validated [`UidConfig`], which only produces powers of
    /// two.
    ///
    /// [`UidConfig`]: crate::UidConfig
    pub fn new(capacity: u64) -> Self {
        assert!(
            capacity.is_power_of_two(),
            "ring buffer capacity must be a power of two, got {capacity}"
        );
        let slots = (0..capacity).map(|_| Slot::new()).collect();
        Self {
            slots,
            mask: capacity - 1,
            tail: CachePadded::new(AtomicU64::new(0)),
            cursor: CachePadded::new(AtomicU64::new(0)),
        }
    }

    /// Number of slots in the buffer.
    pub fn capacity(&self) -> u64 {
        self.mask + 1
    }

    /// Number of produced-but-unconsumed UIDs. Always within
    /// `0..=capacity()`.
    pub fn occupancy(&self) -> u64 {
        // Load cursor first: it only moves toward tail, so a stale cursor can
        // overstate occupancy but never produce tail < cursor.
        let cursor = self.cursor.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        tail.saturating_sub(cursor)
    }

    /// True when every slot holds an unconsumed UID.
    pub fn is_full(&self) -> bool {
        self.occupancy() == self.capacity()
    }

    /// True when occupancy has dropped below `percent` of capacity. Used as a
    /// level-triggered refill signal, so concurrent takes may observe it
    /// simultaneously; the padding task's single-flight guard coalesces the
    /// redundant triggers.
    pub fn below_threshold(&self, percent: u32) -> bool {
        occupancy_below(self.occupancy(), self.capacity(), percent)
    }

    /// Attempts to publish one UID into the next free slot.
    ///
    /// Returns `false` without blocking when the buffer is logically full or
    /// when the target slot has not yet been fully released by a consumer
    /// mid-take. The caller decides what happens to the rejected value; the
    /// sequence space it consumed is never reclaimed.
    pub fn try_put(&self, uid: i64) -> bool {
        let tail = self.tail.load(Ordering::Relaxed);
        let cursor = self.cursor.load(Ordering::Acquire);
        if tail - cursor == self.capacity() {
            return false;
        }

        let slot = &self.slots[(tail & self.mask) as usize];
        // A consumer advances cursor before resetting the slot flag, so a
        // fresh reading of cursor does not guarantee the slot is released
        // yet. Treat a still-held slot as full rather than spinning.
        if slot.flag.load(Ordering::Acquire) != CAN_PUT {
            return false;
        }

        slot.value.store(uid, Ordering::Relaxed);
        // Payload write happens-before the flag flip.
        slot.flag.store(CAN_TAKE, Ordering::Release);
        // Publish the new tail last so takers never chase an unpublished
        // slot.
        self.tail.store(tail + 1, Ordering::Release);
        true
    }

    /// Attempts to consume the oldest unconsumed UID.
    ///
    /// Returns `None` without blocking when the buffer is empty. Concurrent
    /// callers race on the cursor with CAS; each produced UID is returned to
    /// exactly one caller.
    pub fn try_take(&self) -> Option<i64> {
        loop {
            let cursor = self.cursor.load(Ordering::Relaxed);
            let tail = self.tail.load(Ordering::Acquire);
            if cursor == tail {
                return None;
            }

            if self
                .cursor
                .compare_exchange_weak(
                    cursor,
                    cursor + 1,
                    Ordering::AcqRel,
                    Ordering::Relaxed,
                )
                .is_err()
            {
                // Lost the race for this slot; retry on the next one.
                continue;
            }

            let slot = &self.slots[(cursor & self.mask) as usize];
            if slot.flag.load(Ordering::Acquire) != CAN_TAKE {
                // Unreachable by construction: the producer publishes the
                // flag before advancing tail. Kept as a guard against a
                // corrupted slot ever leaking a stale payload.
                tracing::error!(cursor, "ring buffer slot not in takeable state");
                return None;
            }
            let uid = slot.value.load(Ordering::Relaxed);
            slot.flag.store(CAN_PUT, Ordering::Release);
            return Some(uid);
        }
    }
}

/// Percentage comparison widened to `u128`: the products would wrap `u64`
/// for capacities above `2^57`, which the configuration space still admits.
fn occupancy_below(occupancy: u64, capacity: u64, percent: u32) -> bool {
    u128::from(occupancy) * 100 < u128::from(capacity) * u128::from(percent)
}
