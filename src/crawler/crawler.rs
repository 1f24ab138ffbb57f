use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use reqwest::Client;
use tokio::sync::{mpsc, oneshot, Mutex as TokioMutex};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::common::config::CrawlerConfig;
use crate::common::error::{Error, Result};
use crate::crawler::fetcher;
use crate::crawler::normalize::normalise;
use crate::crawler::parser;
use crate::crawler::queue::Queue;
use crate::crawler::quiescence;
use crate::crawler::resource::Resource;
use crate::crawler::robots::RobotsPolicy;
use crate::crawler::throttle::Throttle;
use crate::crawler::worker::Worker;

struct Shared {
    client: Client,
    config: CrawlerConfig,
    workers: StdMutex<HashMap<String, Arc<Worker>>>,
    queue: Queue,
    throttle: Throttle,
}

/// Owns the Worker registry, Queue, and Throttle, and runs the dispatch
/// loop. The registration mutex serializes `crawl()` calls.
pub struct Crawler {
    shared: Arc<Shared>,
    register_lock: TokioMutex<()>,
    control_tx: mpsc::Sender<oneshot::Sender<()>>,
}

impl Crawler {
    pub fn new(config: CrawlerConfig) -> Self {
        let (queue, queue_rx) = Queue::new(config.queue_capacity);
        let throttle = Throttle::new(config.throttle_capacity);
        let client = Client::new();

        let shared = Arc::new(Shared {
            client,
            config,
            workers: StdMutex::new(HashMap::new()),
            queue,
            throttle,
        });

        let (control_tx, control_rx) = mpsc::channel(1);
        tokio::spawn(dispatch_loop(Arc::clone(&shared), queue_rx, control_rx));

        Self {
            shared,
            register_lock: TokioMutex::new(()),
            control_tx,
        }
    }

    /// Registers a new crawl for `raw_url` and pushes its seed Resource onto
    /// the Queue. Returns the registry key (the parsed seed's string form)
    /// and the effective depth, in that order.
    pub async fn crawl(&self, raw_url: &str, depth: usize) -> Result<(String, usize)> {
        let _guard = self.register_lock.lock().await;

        let seed = Url::parse(raw_url).map_err(|e| Error::ClientInput(e.to_string()))?;
        let key = seed.as_str().to_string();

        if self.shared.workers.lock().unwrap().contains_key(&key) {
            return Err(Error::DomainAlreadyRegistered(key));
        }

        let robots =
            RobotsPolicy::fetch(&self.shared.client, &seed, &self.shared.config.user_agent)
                .await?;

        let effective_depth = if depth == 0 {
            self.shared.config.max_depth
        } else {
            depth
        };

        let worker = Worker::new(seed.clone(), effective_depth, robots);
        self.shared
            .workers
            .lock()
            .unwrap()
            .insert(key.clone(), Arc::clone(&worker));
        info!(domain = %key, depth = effective_depth, "worker registered");

        tokio::spawn(quiescence::run(
            Arc::clone(&worker),
            Duration::from_secs(self.shared.config.quiescence_seconds),
        ));

        self.shared.queue.send(Resource::seed(seed)).await;

        Ok((key, effective_depth))
    }

    /// Pure registry lookup; `domain` must be the exact string form used at
    /// registration.
    pub fn worker(&self, domain: &str) -> Option<Arc<Worker>> {
        self.shared.workers.lock().unwrap().get(domain).cloned()
    }

    /// Stops the dispatch loop, closes the Queue, and waits for every
    /// Worker's outstanding fetches to drain.
    pub async fn close(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.control_tx.send(ack_tx).await.is_ok() {
            let _ = ack_rx.await;
        }

        let workers: Vec<Arc<Worker>> = self
            .shared
            .workers
            .lock()
            .unwrap()
            .values()
            .cloned()
            .collect();
        for worker in workers {
            worker.drain_fetch_tasks().await;
        }
        info!("crawler closed");
    }
}

/// Single consumer of the Queue. Selects between incoming Resources and a
/// stop signal; on stop, closes the Queue and acks the caller.
async fn dispatch_loop(
    shared: Arc<Shared>,
    mut queue_rx: mpsc::Receiver<Resource>,
    mut control_rx: mpsc::Receiver<oneshot::Sender<()>>,
) {
    loop {
        tokio::select! {
            resource = queue_rx.recv() => {
                match resource {
                    Some(resource) => admit(&shared, resource).await,
                    None => break,
                }
            }
            ack = control_rx.recv() => {
                shared.queue.close();
                queue_rx.close();
                if let Some(ack) = ack {
                    let _ = ack.send(());
                }
                break;
            }
        }
    }
}

/// Admission gates for one dequeued Resource. Every rejection is silent
/// except the robots gate, which logs at error level.
async fn admit(shared: &Arc<Shared>, resource: Resource) {
    if shared.queue.is_closed() {
        return;
    }

    let worker = {
        let workers = shared.workers.lock().unwrap();
        workers.get(resource.root.as_str()).cloned()
    };
    let Some(worker) = worker else {
        debug!(url = %resource.url, "admission: no worker for root, dropping");
        return;
    };

    if !worker.track(&resource.url_string) {
        debug!(url = %resource.url_string, "admission: already tracked, dropping");
        return;
    }

    if resource.depth > worker.crawl_depth {
        debug!(url = %resource.url_string, depth = resource.depth, "admission: depth exceeded, dropping");
        return;
    }

    if !worker.robots.is_allowed(&resource.url) {
        error!(url = %resource.url_string, "admission: rejected by robots.txt");
        return;
    }

    debug!(url = %resource.url_string, "admission: admitted");
    let shared = Arc::clone(shared);
    worker.spawn_fetch(run_fetch(shared, Arc::clone(&worker), resource)).await;
}

/// The fetch pipeline for one admitted Resource: throttle, MIME gate, GET,
/// title/link extraction, tree attach, child re-enqueue.
async fn run_fetch(shared: Arc<Shared>, worker: Arc<Worker>, mut resource: Resource) {
    let _permit = shared.throttle.acquire().await;

    if shared.queue.is_closed() {
        return;
    }

    let timeout = Duration::from_secs(shared.config.timeout_seconds);
    let user_agent = &shared.config.user_agent;

    let is_seed = resource.depth == 1;

    let is_html = match fetcher::probe_html(&shared.client, &resource.url, user_agent, timeout).await
    {
        Ok(is_html) => is_html,
        Err(e) => {
            warn!(url = %resource.url_string, error = %e, "MIME probe failed, dropping");
            if is_seed {
                worker.mark_error();
            }
            return;
        }
    };
    if !is_html {
        if is_seed {
            worker.mark_error();
        }
        return;
    }

    worker.mark_in_progress();

    let outcome = match fetcher::get(&shared.client, &resource.url, user_agent, timeout).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(url = %resource.url_string, error = %e, "GET failed, dropping");
            if is_seed {
                worker.mark_error();
            }
            return;
        }
    };

    resource.http_status_code = outcome.status_code;
    let extracted = parser::extract(&outcome.body);
    resource.title = extracted.title;

    worker.insert(resource.clone());

    for href in extracted.links {
        let Some(child_url) = normalise(&href, &resource.url) else {
            continue;
        };
        if shared.queue.is_closed() {
            break;
        }
        let child = Resource::child_of(&resource, child_url);
        let shared = Arc::clone(&shared);
        tokio::spawn(async move {
            shared.queue.send(child).await;
        });
    }
}
