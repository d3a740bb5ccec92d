use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Per-order write locks. Every read-modify-write flow on an order holds
/// that order's lock from load through save, so concurrent writers to the
/// same order serialize while writers to different orders run in parallel.
#[derive(Clone, Default)]
pub struct OrderLocks {
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl OrderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, order_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(order_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Forgets the slot for an order that no longer exists. Guards handed
    /// out earlier stay valid; later acquires get a fresh slot.
    pub fn discard(&self, order_id: Uuid) {
        self.locks.remove(&order_id);
    }
}
