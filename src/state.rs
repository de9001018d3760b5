//! Shared count state.
//!
//! `SharedCount` is the single point of truth for the current occupancy
//! count. The acquisition loop (or a push handler) writes it, API readers
//! read it concurrently. A snapshot is always a matched (count, timestamp)
//! pair: updates replace the whole struct under the write guard, so readers
//! never observe a torn value, and `updated_at` order matches publish order.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

/// The most recently published count and when it was published.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CountSnapshot {
    pub count: u64,
    pub updated_at: SystemTime,
}

/// Cloneable handle to the shared count. Starts at zero.
#[derive(Clone)]
pub struct SharedCount {
    inner: Arc<RwLock<CountSnapshot>>,
}

impl SharedCount {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(CountSnapshot {
                count: 0,
                updated_at: SystemTime::now(),
            })),
        }
    }

    /// Replace the published count, stamping the update time under the
    /// write guard.
    pub fn publish(&self, count: u64) {
        // Writes are whole-struct assignments, so a poisoned guard still
        // holds a consistent snapshot; recover instead of propagating.
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = CountSnapshot {
            count,
            updated_at: SystemTime::now(),
        };
    }

    /// Read the latest fully-published snapshot. Never blocks on the
    /// acquisition loop and never fails.
    pub fn snapshot(&self) -> CountSnapshot {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SharedCount {
    fn default() -> Self {
        Self::new()
    }
}
