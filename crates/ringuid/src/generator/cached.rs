use crate::{
    BitLayout, CachingWorkerIdAssigner, DropAndLog, Error, ErrorOnEmpty, FileWorkerIdCache,
    PaddingExecutor, PaddingScheduler, PutRejectPolicy, Result, RingBuffer, SystemClock,
    TakeRejectPolicy, TimeSource, UidConfig, UidParts, WorkerIdAssigner, WorkerIdCache,
    WorkerNode,
};
use std::path::PathBuf;
use std::sync::Arc;

/// The UID generator facade: pre-computed IDs served from a ring buffer.
///
/// Construction resolves the process's worker identity (optionally reusing a
/// cached id), builds the ring buffer, eagerly fills it to capacity, and
/// starts the periodic refill scheduler when configured. From then on
/// [`next_id`] is allocation-only: it pops a pre-computed ID and, when
/// occupancy falls below the padding factor, fires an asynchronous refill.
///
/// `next_id` never blocks. When the buffer is drained faster than padding
/// refills it, the configured take-reject policy decides what the caller
/// sees — by default [`Error::BufferEmpty`].
///
/// # Example
///
/// ```
/// use ringuid::{CachedUidGenerator, InMemoryWorkerIdAssigner, UidConfig};
///
/// let generator = CachedUidGenerator::new(
///     UidConfig::default().reusable(false),
///     InMemoryWorkerIdAssigner::new(),
/// )
/// .unwrap();
///
/// let uid = generator.next_id().unwrap();
/// assert_eq!(generator.parse(uid).worker_id, generator.worker_id());
/// ```
///
/// [`next_id`]: Self::next_id
pub struct CachedUidGenerator {
    bits: BitLayout,
    worker_id: u64,
    node: WorkerNode,
    epoch_secs: u64,
    padding_factor: u32,
    buffer: Arc<RingBuffer>,
    padding: Arc<PaddingExecutor>,
    take_policy: Arc<dyn TakeRejectPolicy>,
    _scheduler: Option<PaddingScheduler>,
}

impl CachedUidGenerator {
    /// Builds a generator with default policies, clock, and identity cache.
    pub fn new<A: WorkerIdAssigner>(config: UidConfig, assigner: A) -> Result<Self> {
        Self::builder(config).build(assigner)
    }

    /// Starts a builder for customizing policies, clock, cache, or node
    /// identity.
    pub fn builder(config: UidConfig) -> CachedUidGeneratorBuilder {
        CachedUidGeneratorBuilder {
            config,
            clock: None,
            take_policy: Arc::new(ErrorOnEmpty),
            put_policy: Arc::new(DropAndLog),
            cache: None,
            node: None,
        }
    }

    /// Returns the next pre-computed UID.
    ///
    /// Fails according to the take-reject policy when the buffer is empty
    /// (default: [`Error::BufferEmpty`]). Padding failures never surface
    /// here; they are background conditions visible in logs.
    pub fn next_id(&self) -> Result<i64> {
        match self.buffer.try_take() {
            Some(uid) => {
                if self.buffer.below_threshold(self.padding_factor) {
                    self.padding.trigger();
                }
                Ok(uid)
            }
            None => self.take_policy.on_empty(),
        }
    }

    /// Decodes a UID into its fields. Diagnostics only.
    pub fn parse(&self, uid: i64) -> UidParts {
        self.bits.deallocate(uid)
    }

    /// Renders a UID and its decoded fields, with the timestamp restored to
    /// seconds since 1970-01-01 UTC.
    pub fn format(&self, uid: i64) -> String {
        let parts = self.parse(uid);
        format!(
            "{{\"UID\":\"{}\",\"timestamp\":\"{}\",\"workerId\":\"{}\",\"sequence\":\"{}\"}}",
            uid,
            self.epoch_secs + parts.elapsed,
            parts.worker_id,
            parts.seq
        )
    }

    /// The worker id encoded into every UID this generator mints.
    pub fn worker_id(&self) -> u64 {
        self.worker_id
    }

    /// The identity record this process registered at startup.
    pub fn node(&self) -> &WorkerNode {
        &self.node
    }

    /// The bit layout in effect.
    pub fn layout(&self) -> &BitLayout {
        &self.bits
    }

    /// Number of pre-computed UIDs currently available.
    pub fn available(&self) -> u64 {
        self.buffer.occupancy()
    }
}

/// Builder for [`CachedUidGenerator`].
pub struct CachedUidGeneratorBuilder {
    config: UidConfig,
    clock: Option<Arc<dyn TimeSource>>,
    take_policy: Arc<dyn TakeRejectPolicy>,
    put_policy: Arc<dyn PutRejectPolicy>,
    cache: Option<Box<dyn WorkerIdCache>>,
    node: Option<WorkerNode>,
}

impl CachedUidGeneratorBuilder {
    /// Overrides the time source. Defaults to [`SystemClock`] anchored to the
    /// configured epoch.
    pub fn clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Overrides the take-side exhaustion policy.
    pub fn take_policy(mut self, policy: Arc<dyn TakeRejectPolicy>) -> Self {
        self.take_policy = policy;
        self
    }

    /// Overrides the put-side saturation policy.
    pub fn put_policy(mut self, policy: Arc<dyn PutRejectPolicy>) -> Self {
        self.put_policy = policy;
        self
    }

    /// Overrides the worker identity cache used when `reusable` is set.
    /// Defaults to a [`FileWorkerIdCache`] under the OS temp directory.
    pub fn identity_cache(mut self, cache: Box<dyn WorkerIdCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Overrides the node identity record. Defaults to [`WorkerNode::build`].
    pub fn node(mut self, node: WorkerNode) -> Self {
        self.node = Some(node);
        self
    }

    /// Resolves the worker identity, fills the buffer, and starts background
    /// refill.
    ///
    /// Startup-fatal failures: invalid configuration, slot-store assignment
    /// failure, an assigned id that overflows `worker_bits`, and any error
    /// during the initial eager fill.
    pub fn build<A: WorkerIdAssigner>(self, assigner: A) -> Result<CachedUidGenerator> {
        let bits = self.config.validate()?;
        let node = self.node.unwrap_or_else(WorkerNode::build);

        let worker_id = if self.config.reusable {
            let cache = self
                .cache
                .unwrap_or_else(|| Box::new(FileWorkerIdCache::new(default_cache_dir())));
            CachingWorkerIdAssigner::new(assigner, cache).assign_worker_id(&node)?
        } else {
            assigner.assign_worker_id(&node)?
        };
        if worker_id > bits.max_worker_id() {
            return Err(Error::WorkerIdOverflow {
                worker_id,
                max: bits.max_worker_id(),
            });
        }
        tracing::info!(worker_id, node = %node, layout = %bits, "worker identity resolved");

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock::with_epoch(self.config.epoch)));
        let buffer = Arc::new(RingBuffer::new(self.config.buffer_size()));
        let padding = Arc::new(PaddingExecutor::new(
            Arc::clone(&buffer),
            bits,
            worker_id,
            clock,
            self.put_policy,
        ));

        // Eager fill so the first foreground call already finds a full
        // buffer. Construction is exclusive, so this pass cannot coalesce
        // away.
        padding.pad_to_full()?;

        let scheduler = self
            .config
            .schedule_interval
            .map(|interval| PaddingScheduler::start(Arc::clone(&padding), interval));

        Ok(CachedUidGenerator {
            bits,
            worker_id,
            node,
            epoch_secs: self.config.epoch.as_secs(),
            padding_factor: self.config.padding_factor,
            buffer,
            padding,
            take_policy: self.take_policy,
            _scheduler: scheduler,
        })
    }
}

fn default_cache_dir() -> PathBuf {
    std::env::temp_dir().join("ringuid")
}
