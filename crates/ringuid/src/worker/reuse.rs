use crate::{Result, WorkerIdAssigner, WorkerIdCache, WorkerNode};

/// Decorator that reuses a locally cached worker id before delegating to the
/// wrapped slot store.
///
/// Lifecycle per assignment: look the node's identity token up in the cache;
/// a stored value `> 0` is trusted as a valid prior assignment and returned
/// without contacting the store. On a miss the call is delegated, and the
/// fresh id is persisted for the next restart. Cache failures on either side
/// are logged and never fail the assignment — reuse is simply unavailable
/// until the cache recovers.
///
/// # Known risk
///
/// The cached value is deliberately not re-validated against the store. If
/// two processes ever derive the same identity token (for example, container
/// runtimes recycling a fixed port), both will trust the same cached record
/// and mint IDs with the same worker id. Deployments where tokens can
/// collide should disable reuse.
pub struct CachingWorkerIdAssigner<A, C> {
    inner: A,
    cache: C,
}

impl<A, C> CachingWorkerIdAssigner<A, C>
where
    A: WorkerIdAssigner,
    C: WorkerIdCache,
{
    pub fn new(inner: A, cache: C) -> Self {
        Self { inner, cache }
    }

    /// Consumes the decorator, returning the wrapped store.
    pub fn into_inner(self) -> A {
        self.inner
    }
}

impl<A, C> WorkerIdAssigner for CachingWorkerIdAssigner<A, C>
where
    A: WorkerIdAssigner,
    C: WorkerIdCache,
{
    fn assign_worker_id(&self, node: &WorkerNode) -> Result<u64> {
        let token = node.identity_token();
        match self.cache.load(&token) {
            Ok(Some(worker_id)) if worker_id > 0 => {
                tracing::info!(worker_id, %token, "reusing cached worker id");
                return Ok(worker_id);
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(%err, %token, "worker id cache read failed; requesting fresh id");
            }
        }

        let worker_id = self.inner.assign_worker_id(node)?;
        if let Err(err) = self.cache.store(&token, worker_id) {
            // Non-fatal: the process runs with the fresh id, it just cannot
            // reclaim it after the next restart.
            tracing::warn!(%err, worker_id, %token, "worker id cache write failed");
        }
        Ok(worker_id)
    }
}
