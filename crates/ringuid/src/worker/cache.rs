use crate::Result;
use parking_lot::Mutex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Local persistence for previously assigned worker ids.
///
/// Keyed by a node-identity token; a stored value is read on the next startup
/// before the slot store is contacted. Cache failures are non-fatal to
/// assignment by policy: a process that cannot read or write its record
/// simply runs with a fresh id.
pub trait WorkerIdCache: Send + Sync {
    /// Returns the worker id previously stored for `token`, if any.
    fn load(&self, token: &str) -> Result<Option<u64>>;

    /// Records `worker_id` for `token`, overwriting any previous record.
    fn store(&self, token: &str, worker_id: u64) -> Result<()>;
}

impl<C: WorkerIdCache + ?Sized> WorkerIdCache for Box<C> {
    fn load(&self, token: &str) -> Result<Option<u64>> {
        (**self).load(token)
    }

    fn store(&self, token: &str, worker_id: u64) -> Result<()> {
        (**self).store(token, worker_id)
    }
}

impl<C: WorkerIdCache + ?Sized> WorkerIdCache for std::sync::Arc<C> {
    fn load(&self, token: &str) -> Result<Option<u64>> {
        (**self).load(token)
    }

    fn store(&self, token: &str, worker_id: u64) -> Result<()> {
        (**self).store(token, worker_id)
    }
}

/// A [`WorkerIdCache`] of plain-text files, one record per identity token.
///
/// Each record holds a single decimal worker id. Writes go to a temporary
/// file in the same directory followed by a rename, so a concurrent reader
/// observes either the old record or the new one, never a partial write. An
/// in-process mutex serializes writers within this process.
pub struct FileWorkerIdCache {
    dir: PathBuf,
    write_guard: Mutex<()>,
}

impl FileWorkerIdCache {
    /// Opens (or designates) `dir` as the cache directory. The directory is
    /// created lazily on the first store.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_guard: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, token: &str) -> PathBuf {
        self.dir.join(format!("worker-{token}.id"))
    }
}

impl WorkerIdCache for FileWorkerIdCache {
    fn load(&self, token: &str) -> Result<Option<u64>> {
        let path = self.record_path(token);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        match contents.trim().parse::<u64>() {
            Ok(worker_id) => Ok(Some(worker_id)),
            Err(_) => {
                // A corrupt record is indistinguishable from no record; the
                // next successful assignment overwrites it wholesale.
                tracing::warn!(path = %path.display(), "ignoring corrupt worker id record");
                Ok(None)
            }
        }
    }

    fn store(&self, token: &str, worker_id: u64) -> Result<()> {
        let _guard = self.write_guard.lock();
        fs::create_dir_all(&self.dir)?;
        let path = self.record_path(token);
        let staging = path.with_extension("id.tmp");
        fs::write(&staging, worker_id.to_string())?;
        fs::rename(&staging, &path)?;
        tracing::debug!(worker_id, path = %path.display(), "persisted worker id");
        Ok(())
    }
}
