//! Per-id locking (§4.3, §5): serializes concurrent PATCHes against the
//! same upload id and lets the sweeper skip uploads that are mid-write.

use std::collections::HashMap;
use std::sync::Arc;

use salvo_core::async_trait;
use tokio::sync::{Mutex, OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

/// An RAII guard held for the duration of a read or write against one
/// upload id. Dropping it releases the lock.
pub enum LockGuard {
    Read(OwnedRwLockReadGuard<()>),
    Write(OwnedRwLockWriteGuard<()>),
}

#[async_trait]
pub trait Locker: Send + Sync + 'static {
    async fn read_lock(&self, id: &str) -> LockGuard;
    async fn write_lock(&self, id: &str) -> LockGuard;
    /// Non-blocking attempt used by the sweeper: `None` if another
    /// handler currently holds the lock for `id`.
    async fn try_write_lock(&self, id: &str) -> Option<LockGuard>;
}

/// In-process locker keyed by upload id. Entries are created lazily and
/// never removed (the map holding a couple thousand small `RwLock`s for
/// the lifetime of the process is negligible next to the payloads they
/// guard).
#[derive(Clone, Default)]
pub struct MemoryLocker {
    inner: Arc<Mutex<HashMap<String, Arc<RwLock<()>>>>>,
}

impl MemoryLocker {
    pub fn new() -> Self {
        Self::default()
    }

    async fn entry(&self, id: &str) -> Arc<RwLock<()>> {
        let mut map = self.inner.lock().await;
        map.entry(id.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }
}

#[async_trait]
impl Locker for MemoryLocker {
    async fn read_lock(&self, id: &str) -> LockGuard {
        let lock = self.entry(id).await;
        LockGuard::Read(lock.read_owned().await)
    }

    async fn write_lock(&self, id: &str) -> LockGuard {
        let lock = self.entry(id).await;
        LockGuard::Write(lock.write_owned().await)
    }

    async fn try_write_lock(&self, id: &str) -> Option<LockGuard> {
        let lock = self.entry(id).await;
        lock.try_write_owned().ok().map(LockGuard::Write)
    }
}
