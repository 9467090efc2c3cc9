use crate::{Error, Result};

/// Policy invoked when a take finds the ring buffer empty.
///
/// The policy decides what the foreground caller sees: the default surfaces
/// the exhaustion as an error immediately, because blocking under load would
/// defeat the low-latency goal. A custom policy may substitute a fallback
/// value instead (e.g. minting inline), but it must not wait unboundedly.
pub trait TakeRejectPolicy: Send + Sync {
    fn on_empty(&self) -> Result<i64>;
}

/// Policy invoked when padding finds the ring buffer full.
///
/// The rejected UID has already consumed sequence space (the put that minted
/// it advanced the generator), so it is handed to the policy for observation
/// and then discarded. It is never re-queued.
pub trait PutRejectPolicy: Send + Sync {
    fn on_full(&self, uid: i64);
}

/// Default take policy: raise [`Error::BufferEmpty`] to the caller.
#[derive(Default, Clone, Copy, Debug)]
pub struct ErrorOnEmpty;

impl TakeRejectPolicy for ErrorOnEmpty {
    fn on_empty(&self) -> Result<i64> {
        tracing::warn!("ring buffer drained; rejecting take");
        Err(Error::BufferEmpty)
    }
}

/// Default put policy: log and drop the value.
#[derive(Default, Clone, Copy, Debug)]
pub struct DropAndLog;

impl PutRejectPolicy for DropAndLog {
    fn on_full(&self, uid: i64) {
        tracing::warn!(uid, "ring buffer full; dropping produced UID");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_take_policy_surfaces_exhaustion() {
        let err = ErrorOnEmpty.on_empty().unwrap_err();
        assert!(matches!(err, Error::BufferEmpty));
    }
}
