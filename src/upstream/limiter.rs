use crate::upstream::error::UpstreamError;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Process-wide cap on simultaneous upstream calls.
///
/// Clones share the same permits. Admission is first-come first-served.
#[derive(Debug, Clone)]
pub struct UpstreamLimiter {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl UpstreamLimiter {
    /// A limiter admitting `max_concurrent` calls at once (at least one).
    pub fn new(max_concurrent: usize) -> Self {
        let capacity = max_concurrent.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Waits for a free slot. The slot is released when the permit is dropped.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, UpstreamError> {
        self.permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| UpstreamError::LimiterClosed)
    }

    /// Total number of permits.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits not currently held by a request.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}
