use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Global counting semaphore bounding in-flight fetches, independent of
/// Worker identity. Capacity defaults to 20.
#[derive(Clone)]
pub struct Throttle {
    semaphore: Arc<Semaphore>,
}

impl Throttle {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
        }
    }

    /// Blocks until a slot is free. The returned permit releases the slot
    /// on drop, covering every exit path including early returns and
    /// panics.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .expect("throttle semaphore is never closed")
    }
}
