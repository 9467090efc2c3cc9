use crate::{Result, WorkerNode};
use std::sync::atomic::{AtomicU64, Ordering};

/// The worker slot store: durably assigns small integer worker ids.
///
/// The store must make concurrent calls from different processes mutually
/// exclusive so that every call yields a distinct, previously-unused id; the
/// persistence technology behind that guarantee is the implementation's
/// choice. Sizing the id space against `worker_bits` is the caller's
/// responsibility — the generator validates the assigned id against its
/// layout and refuses to start on overflow.
///
/// Assignment is disposable by default: a restarted process consumes a fresh
/// id. Wrap any implementation in [`CachingWorkerIdAssigner`] to reclaim the
/// previous id instead.
///
/// [`CachingWorkerIdAssigner`]: crate::CachingWorkerIdAssigner
pub trait WorkerIdAssigner: Send + Sync {
    /// Persists the node draft and returns its assigned worker id.
    fn assign_worker_id(&self, node: &WorkerNode) -> Result<u64>;
}

impl<A: WorkerIdAssigner + ?Sized> WorkerIdAssigner for Box<A> {
    fn assign_worker_id(&self, node: &WorkerNode) -> Result<u64> {
        (**self).assign_worker_id(node)
    }
}

impl<A: WorkerIdAssigner + ?Sized> WorkerIdAssigner for std::sync::Arc<A> {
    fn assign_worker_id(&self, node: &WorkerNode) -> Result<u64> {
        (**self).assign_worker_id(node)
    }
}

/// A process-local [`WorkerIdAssigner`] backed by an atomic counter.
///
/// Ids are unique within one process only, which makes this suitable for
/// single-node deployments and for tests. Multi-process fleets need a store
/// with durable, mutually exclusive assignment.
#[derive(Debug)]
pub struct InMemoryWorkerIdAssigner {
    next: AtomicU64,
}

impl Default for InMemoryWorkerIdAssigner {
    fn default() -> Self {
        Self::starting_at(0)
    }
}

impl InMemoryWorkerIdAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts assignment at the given id.
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl WorkerIdAssigner for InMemoryWorkerIdAssigner {
    fn assign_worker_id(&self, node: &WorkerNode) -> Result<u64> {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        tracing::info!(worker_id = id, node = %node, "assigned fresh worker id");
        Ok(id)
    }
}
