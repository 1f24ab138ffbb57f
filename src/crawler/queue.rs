use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::crawler::resource::Resource;

/// Bounded channel carrying Resources from discovery to fetch, closeable
/// once. All producers (fetch tasks, the seeding path in `Crawler::crawl`)
/// check `is_closed` before sending; the dispatch loop is the sole consumer.
#[derive(Clone)]
pub struct Queue {
    sender: mpsc::Sender<Resource>,
    closed: Arc<AtomicBool>,
}

impl Queue {
    /// Capacity defaults to 100; producers block once the buffer is full.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Resource>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (
            Self {
                sender,
                closed: Arc::new(AtomicBool::new(false)),
            },
            receiver,
        )
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Enqueue a Resource. Returns `false` if the queue has been closed or
    /// the dispatch loop's receiver has already been dropped.
    pub async fn send(&self, resource: Resource) -> bool {
        if self.is_closed() {
            return false;
        }
        self.sender.send(resource).await.is_ok()
    }
}
