use crate::{
    BasicUidGenerator, CachedUidGenerator, Error, FileWorkerIdCache, InMemoryWorkerIdAssigner,
    NodeKind, TimeSource, UidConfig, WorkerNode,
};
use core::time::Duration;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Instant;

struct FixedTime {
    secs: AtomicU64,
}

impl FixedTime {
    fn at(secs: u64) -> Arc<Self> {
        Arc::new(Self {
            secs: AtomicU64::new(secs),
        })
    }

    fn set(&self, secs: u64) {
        self.secs.store(secs, Ordering::Release);
    }
}

impl TimeSource for FixedTime {
    fn current_secs(&self) -> u64 {
        self.secs.load(Ordering::Acquire)
    }
}

fn small_config() -> UidConfig {
    // 8192-slot buffer keeps the tests quick.
    UidConfig::default().boost_power(0).reusable(false)
}

#[test]
fn generator_starts_full_and_serves_unique_ids() {
    let clock = FixedTime::at(500);
    let generator = CachedUidGenerator::builder(small_config())
        .clock(clock)
        .build(InMemoryWorkerIdAssigner::starting_at(9))
        .unwrap();

    assert_eq!(generator.worker_id(), 9);
    assert_eq!(generator.available(), 8192);

    let mut seen = HashSet::new();
    for _ in 0..2_000 {
        let uid = generator.next_id().unwrap();
        assert!(seen.insert(uid), "duplicate UID: {uid}");
        let parts = generator.parse(uid);
        assert_eq!(parts.worker_id, 9);
        assert!(parts.elapsed >= 500);
    }
}

#[test]
fn occupancy_recovers_after_threshold_trigger() {
    let clock = FixedTime::at(100);
    let generator = CachedUidGenerator::builder(small_config())
        .clock(clock)
        .build(InMemoryWorkerIdAssigner::new())
        .unwrap();

    // Default padding factor 50 on an 8192 buffer: the refill threshold is
    // 4096, so one extra take drops occupancy below it.
    for _ in 0..4_097 {
        generator.next_id().unwrap();
    }

    let deadline = Instant::now() + Duration::from_secs(5);
    while generator.available() < 8192 {
        assert!(
            Instant::now() < deadline,
            "threshold-triggered padding never refilled the buffer (at {})",
            generator.available()
        );
        thread::yield_now();
    }
}

#[test]
fn epoch_exhaustion_drains_then_surfaces_buffer_empty() {
    // 4 timestamp bits: seconds 0..=15 are all this layout can express. The
    // clock starts at 10, so at most six seconds of sequence space remain.
    let config = UidConfig::default()
        .time_bits(4)
        .worker_bits(46)
        .boost_power(0)
        .reusable(false);
    let clock = FixedTime::at(10);
    let generator = CachedUidGenerator::builder(config)
        .clock(clock)
        .build(InMemoryWorkerIdAssigner::new())
        .unwrap();

    let mut seen = HashSet::new();
    let mut empty_streak = 0;
    while empty_streak < 20 {
        match generator.next_id() {
            Ok(uid) => {
                assert!(seen.insert(uid), "duplicate UID: {uid}");
                empty_streak = 0;
            }
            Err(Error::BufferEmpty) => {
                empty_streak += 1;
                thread::sleep(Duration::from_millis(5));
            }
            Err(err) => panic!("unexpected foreground error: {err}"),
        }
    }

    // Six seconds of 8192 sequences, minus whatever the final aborted
    // padding pass could not produce.
    assert!(seen.len() >= 8192, "got {}", seen.len());
    assert!(seen.len() <= 6 * 8192, "got {}", seen.len());
}

#[test]
fn reusable_identity_survives_restart() {
    let dir = std::env::temp_dir().join(format!("ringuid-reuse-test-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    let node = WorkerNode::from_parts("host", "1700123-77", NodeKind::Actual, 0);
    let config = UidConfig::default().boost_power(0).reusable(true);

    let clock = FixedTime::at(1);
    let first = CachedUidGenerator::builder(config.clone())
        .clock(clock)
        .identity_cache(Box::new(FileWorkerIdCache::new(&dir)))
        .node(node.clone())
        .build(InMemoryWorkerIdAssigner::starting_at(41))
        .unwrap();
    assert_eq!(first.worker_id(), 41);
    drop(first);

    // Restart: same node identity, same cache directory, a store that would
    // hand out a different id if it were consulted.
    let clock = FixedTime::at(2);
    let second = CachedUidGenerator::builder(config)
        .clock(clock)
        .identity_cache(Box::new(FileWorkerIdCache::new(&dir)))
        .node(node)
        .build(InMemoryWorkerIdAssigner::starting_at(9_000))
        .unwrap();
    assert_eq!(second.worker_id(), 41);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn oversized_worker_id_refuses_to_start() {
    let clock = FixedTime::at(1);
    // Match on the Result directly: the generator itself is opaque (it holds
    // policy trait objects), only the error shape matters here.
    let result = CachedUidGenerator::builder(small_config())
        .clock(clock)
        .build(InMemoryWorkerIdAssigner::starting_at(1 << 22));
    assert!(matches!(result, Err(Error::WorkerIdOverflow { .. })));
}

#[test]
fn invalid_config_refuses_to_start() {
    let result = CachedUidGenerator::new(
        UidConfig::default().padding_factor(100),
        InMemoryWorkerIdAssigner::new(),
    );
    assert!(matches!(result, Err(Error::Config { .. })));
}

#[test]
fn format_restores_absolute_timestamp() {
    let clock = FixedTime::at(33);
    let generator = CachedUidGenerator::builder(small_config())
        .clock(clock)
        .build(InMemoryWorkerIdAssigner::starting_at(5))
        .unwrap();

    let uid = generator.next_id().unwrap();
    let rendered = generator.format(uid);
    let epoch_secs = UidConfig::default().epoch.as_secs();
    assert!(rendered.contains(&format!("\"UID\":\"{uid}\"")));
    assert!(rendered.contains(&format!("\"timestamp\":\"{}\"", epoch_secs + 33)));
    assert!(rendered.contains("\"workerId\":\"5\""));
    assert!(rendered.contains("\"sequence\":\"0\""));

    // The diagnostic form is intentionally JSON, so operators can feed it to
    // structured tooling.
    let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(parsed["workerId"], "5");
}

#[test]
fn basic_generator_increments_within_a_tick() {
    let config = UidConfig::default();
    let clock = FixedTime::at(42);
    let generator = BasicUidGenerator::with_clock(&config, 3, clock).unwrap();

    let bits = crate::BitLayout::new(28, 22, 13).unwrap();
    for expected_seq in 0..5 {
        let parts = bits.deallocate(generator.next_id().unwrap());
        assert_eq!(parts.elapsed, 42);
        assert_eq!(parts.worker_id, 3);
        assert_eq!(parts.seq, expected_seq);
    }
}

#[test]
fn basic_generator_resets_sequence_on_new_tick() {
    let config = UidConfig::default();
    let clock = FixedTime::at(10);
    let generator = BasicUidGenerator::with_clock(&config, 1, Arc::clone(&clock) as _).unwrap();

    generator.next_id().unwrap();
    generator.next_id().unwrap();
    clock.set(11);
    let uid = generator.next_id().unwrap();
    let parts = crate::BitLayout::new(28, 22, 13).unwrap().deallocate(uid);
    assert_eq!(parts.elapsed, 11);
    assert_eq!(parts.seq, 0);
}

#[test]
fn basic_generator_rejects_clock_regression() {
    let config = UidConfig::default();
    let clock = FixedTime::at(10);
    let generator = BasicUidGenerator::with_clock(&config, 1, Arc::clone(&clock) as _).unwrap();

    generator.next_id().unwrap();
    clock.set(9);
    let err = generator.next_id().unwrap_err();
    assert!(matches!(err, Error::ClockRegression { .. }));
}

#[test]
fn basic_generator_waits_out_an_exhausted_tick() {
    let config = UidConfig::default();
    let clock = FixedTime::at(7);
    let generator = BasicUidGenerator::with_clock(&config, 1, Arc::clone(&clock) as _).unwrap();

    let per_second = 8192;
    for _ in 0..per_second {
        generator.next_id().unwrap();
    }

    // The next call spins until the clock advances; bump it from another
    // thread.
    let ticker = Arc::clone(&clock);
    let bump = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        ticker.set(8);
    });
    let uid = generator.next_id().unwrap();
    bump.join().unwrap();

    let parts = crate::BitLayout::new(28, 22, 13).unwrap().deallocate(uid);
    assert_eq!(parts.elapsed, 8);
    assert_eq!(parts.seq, 0);
}
