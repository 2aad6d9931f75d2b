use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// In-process per-order locks. Callers hold the guard across a
/// lifecycle-plus-ledger sequence so two tasks touching the same order
/// run one after the other; distinct orders never contend.
///
/// This complements the row locks the repositories take: the row lock
/// covers a single statement, this covers a whole read-decide-write
/// sequence against the in-memory managers.
#[derive(Default)]
pub struct OrderLocks {
    inner: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl OrderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, order_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            Arc::clone(map.entry(order_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Drop the entry for an order that reached a terminal state. A
    /// task still holding the old guard keeps its Arc alive, so this
    /// never invalidates an acquired lock.
    pub async fn release(&self, order_id: Uuid) {
        let mut map = self.inner.lock().await;
        map.remove(&order_id);
    }
}
