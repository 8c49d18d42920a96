//! Display-order id allocation

use std::sync::atomic::{AtomicU64, Ordering};

/// Issues strictly increasing ids starting at 0.
///
/// Ids only order projects for display; they are never compared for identity.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next id. Safe to call from any number of threads.
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}
