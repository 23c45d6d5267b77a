//! Monotonic reload sequencing.
//!
//! There is no cancellation for in-flight requests: a reload superseded by a
//! newer one still completes. Every reconciler therefore draws a ticket per
//! reload and merges a response only while its ticket is still the latest
//! issued, so results land in issue order instead of completion order.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct SeqGuard(AtomicU64);

impl SeqGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new reload; every earlier ticket becomes stale.
    pub fn issue(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether the given ticket still belongs to the latest reload.
    pub fn is_current(&self, ticket: u64) -> bool {
        self.0.load(Ordering::SeqCst) == ticket
    }
}
