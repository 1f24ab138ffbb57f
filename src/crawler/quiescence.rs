use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::info;

use crate::crawler::worker::{Status, Worker};

/// One ticker per Worker, started at registration. Every `window` it
/// samples `LastUpdated`; once `window` has elapsed with no tree activity
/// the Worker is declared complete.
pub async fn run(worker: Arc<Worker>, window: Duration) {
    let mut ticker = tokio::time::interval(window);
    ticker.tick().await; // first tick fires immediately; skip it

    loop {
        ticker.tick().await;

        if matches!(worker.status(), Status::Complete | Status::Error) {
            continue;
        }

        let idle = Utc::now().signed_duration_since(worker.last_updated());
        if idle.to_std().map(|d| d > window).unwrap_or(false) {
            info!(seed = %worker.seed, "worker quiesced, marking complete");
            worker.complete();
        }
    }
}
