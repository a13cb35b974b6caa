//! Per-review serialization of conversation turns.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Hands out one async lock per review id.  Holding the guard for the whole
/// read-history, call-model, append sequence keeps each turn's CLIENT and
/// ASSISTANT messages adjacent when follow-ups race on the same review.
pub struct TurnLocks {
    locks: Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>,
}

impl std::fmt::Debug for TurnLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.locks.lock().map(|l| l.len()).unwrap_or(0);
        write!(f, "TurnLocks({count} reviews)")
    }
}

impl Default for TurnLocks {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnLocks {
    pub fn new() -> Self {
        Self { locks: Mutex::new(HashMap::new()) }
    }

    /// Wait for exclusive use of `review_id`.
    pub async fn acquire(&self, review_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            // Entries only referenced by the map have no holder or waiter.
            map.retain(|_, l| Arc::strong_count(l) > 1);
            Arc::clone(map.entry(review_id).or_default())
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    pub fn tracked(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }
}
