//! The transactional creator.
//!
//! Every resource creation runs inside a single transactional scope:
//! begin, invoke the domain creation, commit. Callers never observe a
//! resource from this path unless the commit succeeded.

use futures::future::BoxFuture;
use tracing::warn;

use mintd_storage::{DataStore, StorageResult, StoreTransaction};

/// Runs `op` inside a freshly opened transactional scope.
///
/// On success the scope is committed and the created resource returned. If
/// `op` fails, the scope is rolled back and the error propagates unchanged.
/// If the commit itself fails, that failure propagates and the caller must
/// treat the resource as not created — the domain work ran, but none of its
/// effects are visible.
///
/// The scope's effects are buffered until commit, so every exit path that
/// skips the commit — including a panic unwinding through `op` — discards
/// them. Exactly one creation happens per call; no retries are performed at
/// this layer.
pub async fn create_within_transaction<S, T, F>(store: &S, op: F) -> StorageResult<T>
where
    S: DataStore,
    F: for<'tx> FnOnce(&'tx mut S::Tx) -> BoxFuture<'tx, StorageResult<T>>,
    T: Send,
{
    let mut tx = store.begin().await?;

    let created = match op(&mut tx).await {
        Ok(value) => value,
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "rollback failed after creation error");
            }
            return Err(err);
        }
    };

    tx.commit().await?;
    Ok(created)
}
