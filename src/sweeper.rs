//! The Expiration Sweeper (§4.5): a best-effort, idempotent GC pass a host
//! invokes periodically (e.g. from its own `tokio::spawn` timer loop). Not
//! wired to a timer itself — the crate only provides the pass.

use crate::locker::Locker;
use crate::store::UploadStore;

/// Delete every upload whose `expires` has passed. Skips any id currently
/// being written to (its write lock can't be acquired immediately) rather
/// than blocking on it. Returns the number of uploads deleted.
pub async fn sweep_expired(store: &dyn UploadStore, locker: &dyn Locker) -> usize {
    let ids = match store.enumerate().await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!(error = %e, "sweeper: failed to enumerate uploads");
            return 0;
        }
    };

    let now = chrono::Utc::now();
    let mut deleted = 0;

    for id in ids {
        let Some(_guard) = locker.try_write_lock(&id).await else {
            tracing::info!(id, "sweeper: skipping upload currently being written");
            continue;
        };

        let record = match store.load(&id).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(id, error = %e, "sweeper: failed to load sidecar, skipping");
                continue;
            }
        };

        let expires = match chrono::DateTime::parse_from_rfc3339(&record.expires) {
            Ok(expires) => expires.with_timezone(&chrono::Utc),
            Err(e) => {
                tracing::warn!(id, error = %e, "sweeper: unparseable expires, skipping");
                continue;
            }
        };

        if expires < now {
            if let Err(e) = store.delete(&id).await {
                tracing::warn!(id, error = %e, "sweeper: failed to delete expired upload");
                continue;
            }
            deleted += 1;
        }
    }

    deleted
}
