use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use url::Url;

use crate::crawler::resource::Resource;
use crate::crawler::robots::RobotsPolicy;

/// Lifecycle state of a Worker: initialised, in progress, complete, or
/// errored.
///
/// Transitions only ever happen from the dispatch loop (admission, via
/// [`Worker::mark_in_progress`]) or the quiescence detector (via
/// [`Worker::complete`]), so readers can load this atomically without a
/// lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Initialised,
    InProgress,
    Complete,
    Error,
}

impl Status {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Status::Initialised,
            1 => Status::InProgress,
            2 => Status::Complete,
            _ => Status::Error,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Status::Initialised => 0,
            Status::InProgress => 1,
            Status::Complete => 2,
            Status::Error => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Initialised => "initialised",
            Status::InProgress => "in-progress",
            Status::Complete => "complete",
            Status::Error => "error",
        }
    }
}

/// Per-seed-domain crawl state: the visited set, depth cap, robot policy,
/// tree root, status, and activity timestamp.
pub struct Worker {
    pub seed: Url,
    pub crawl_depth: usize,
    pub robots: RobotsPolicy,

    tracker: StdMutex<HashSet<String>>,
    status: AtomicU8,
    last_updated_millis: Arc<AtomicI64>,
    tree: Arc<StdMutex<Option<Resource>>>,
    insert_tx: mpsc::UnboundedSender<Resource>,
    fetch_tasks: Mutex<JoinSet<()>>,
}

impl Worker {
    pub fn new(seed: Url, crawl_depth: usize, robots: RobotsPolicy) -> Arc<Self> {
        let (insert_tx, insert_rx) = mpsc::unbounded_channel();
        let tree = Arc::new(StdMutex::new(None));
        let last_updated_millis = Arc::new(AtomicI64::new(Utc::now().timestamp_millis()));

        tokio::spawn(run_tree_writer(
            insert_rx,
            Arc::clone(&tree),
            Arc::clone(&last_updated_millis),
        ));

        Arc::new(Self {
            seed,
            crawl_depth,
            robots,
            tracker: StdMutex::new(HashSet::new()),
            status: AtomicU8::new(Status::Initialised.as_u8()),
            last_updated_millis,
            tree,
            insert_tx,
            fetch_tasks: Mutex::new(JoinSet::new()),
        })
    }

    /// Check-and-insert `url_string` into the tracker. Returns `true` if
    /// this is the first time the URL has been admitted for this Worker.
    pub fn track(&self, url_string: &str) -> bool {
        self.tracker.lock().unwrap().insert(url_string.to_string())
    }

    pub fn status(&self) -> Status {
        Status::from_u8(self.status.load(Ordering::Acquire))
    }

    pub fn mark_in_progress(&self) {
        if self.status() != Status::InProgress {
            self.status
                .store(Status::InProgress.as_u8(), Ordering::Release);
        }
    }

    pub fn complete(&self) {
        self.status.store(Status::Complete.as_u8(), Ordering::Release);
    }

    /// Marks the crawl as failed outright. Only the seed fetch does this;
    /// failures on any other Resource are dropped without changing status.
    pub fn mark_error(&self) {
        self.status.store(Status::Error.as_u8(), Ordering::Release);
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        let millis = self.last_updated_millis.load(Ordering::Acquire);
        DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
    }

    /// Queue `resource` for insertion into the tree. Handled by a single
    /// dedicated task per Worker so concurrent fetch completions never race
    /// on tree mutation.
    pub fn insert(&self, resource: Resource) {
        let _ = self.insert_tx.send(resource);
    }

    /// Snapshot of the tree root for serving `GET /api/domains/:domain`.
    pub fn tree_snapshot(&self) -> Option<Resource> {
        self.tree.lock().unwrap().clone()
    }

    /// Spawn a fetch task tracked by this Worker's outstanding-fetch set.
    pub async fn spawn_fetch<F>(&self, fut: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.fetch_tasks.lock().await.spawn(fut);
    }

    /// Blocks until every outstanding fetch task has completed.
    pub async fn drain_fetch_tasks(&self) {
        let mut tasks = self.fetch_tasks.lock().await;
        while tasks.join_next().await.is_some() {}
    }
}

async fn run_tree_writer(
    mut insert_rx: mpsc::UnboundedReceiver<Resource>,
    tree: Arc<StdMutex<Option<Resource>>>,
    last_updated_millis: Arc<AtomicI64>,
) {
    let mut pending: HashMap<String, Vec<Resource>> = HashMap::new();

    while let Some(resource) = insert_rx.recv().await {
        last_updated_millis.store(Utc::now().timestamp_millis(), Ordering::Release);
        attach_or_buffer(&tree, &mut pending, resource);
    }
}

/// Attaches `resource` to the tree if its parent is already present;
/// otherwise buffers it under the missing parent's URL and flushes any
/// pending children once their parent does arrive. Nodes at each level are
/// scanned in insertion order and the first match wins.
fn attach_or_buffer(
    tree: &StdMutex<Option<Resource>>,
    pending: &mut HashMap<String, Vec<Resource>>,
    resource: Resource,
) {
    let mut guard = tree.lock().unwrap();

    if guard.is_none() {
        // This path is taken exactly once, by the seed fetch.
        let url_string = resource.url_string.clone();
        *guard = Some(resource);
        drop(guard);
        flush_pending_for(tree, pending, &url_string);
        return;
    }

    let Some(parent_url) = resource.parent.last().cloned() else {
        // A second depth-1 Resource for an already-seeded Worker: treat as
        // a direct child of the root.
        if let Some(root) = guard.as_mut() {
            root.nodes.push(resource);
        }
        return;
    };

    let url_string = resource.url_string.clone();
    let found = guard
        .as_mut()
        .and_then(|root| find_node_mut(root, &parent_url));

    match found {
        Some(node) => {
            node.nodes.push(resource);
            drop(guard);
            flush_pending_for(tree, pending, &url_string);
        }
        None => {
            drop(guard);
            pending.entry(parent_url).or_default().push(resource);
        }
    }
}

/// Recursively flushes any children that were waiting on `parent_url`,
/// then any waiting on those children in turn.
fn flush_pending_for(
    tree: &StdMutex<Option<Resource>>,
    pending: &mut HashMap<String, Vec<Resource>>,
    parent_url: &str,
) {
    let Some(waiting) = pending.remove(parent_url) else {
        return;
    };

    for child in waiting {
        let child_url = child.url_string.clone();
        let mut guard = tree.lock().unwrap();
        if let Some(node) = guard.as_mut().and_then(|root| find_node_mut(root, parent_url)) {
            node.nodes.push(child);
        }
        drop(guard);
        flush_pending_for(tree, pending, &child_url);
    }
}

fn find_node_mut<'a>(node: &'a mut Resource, url_string: &str) -> Option<&'a mut Resource> {
    if node.url_string == url_string {
        return Some(node);
    }
    for child in node.nodes.iter_mut() {
        if let Some(found) = find_node_mut(child, url_string) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn depth_one_child_attaches_directly_to_root() {
        let tree = StdMutex::new(None);
        let mut pending = HashMap::new();

        let root = Resource::seed(url("https://example.com/"));
        let child = Resource::child_of(&root, url("https://example.com/a"));

        attach_or_buffer(&tree, &mut pending, root.clone());
        attach_or_buffer(&tree, &mut pending, child.clone());

        let root = tree.lock().unwrap().clone().unwrap();
        assert_eq!(root.nodes.len(), 1);
        assert_eq!(root.nodes[0].url_string, child.url_string);
        assert!(pending.is_empty());
    }

    #[test]
    fn child_arriving_before_parent_is_buffered_then_flushed() {
        let tree = StdMutex::new(None);
        let mut pending = HashMap::new();

        let root = Resource::seed(url("https://example.com/"));
        let child = Resource::child_of(&root, url("https://example.com/a"));
        let grandchild = Resource::child_of(&child, url("https://example.com/a/b"));

        attach_or_buffer(&tree, &mut pending, root.clone());

        // The grandchild's fetch completes and attaches before its own
        // parent (`child`) has attached to the already-existing root.
        attach_or_buffer(&tree, &mut pending, grandchild.clone());
        assert_eq!(pending.get(&child.url_string).map(Vec::len), Some(1));
        assert!(tree.lock().unwrap().as_ref().unwrap().nodes.is_empty());

        attach_or_buffer(&tree, &mut pending, child.clone());

        let root = tree.lock().unwrap().clone().unwrap();
        assert_eq!(root.nodes.len(), 1);
        assert_eq!(root.nodes[0].url_string, child.url_string);
        assert_eq!(root.nodes[0].nodes.len(), 1);
        assert_eq!(root.nodes[0].nodes[0].url_string, grandchild.url_string);
        assert!(pending.is_empty());
    }

    #[test]
    fn deep_ancestry_walk_finds_leaf_several_levels_down() {
        let tree = StdMutex::new(None);
        let mut pending = HashMap::new();

        let root = Resource::seed(url("https://example.com/"));
        let a = Resource::child_of(&root, url("https://example.com/a"));
        let b = Resource::child_of(&a, url("https://example.com/a/b"));
        let c = Resource::child_of(&b, url("https://example.com/a/b/c"));
        let d = Resource::child_of(&c, url("https://example.com/a/b/c/d"));

        for node in [root.clone(), a.clone(), b.clone(), c.clone(), d.clone()] {
            attach_or_buffer(&tree, &mut pending, node);
        }

        let root = tree.lock().unwrap().clone().unwrap();
        let found = root
            .nodes
            .iter()
            .find(|n| n.url_string == a.url_string)
            .and_then(|n| n.nodes.iter().find(|n| n.url_string == b.url_string))
            .and_then(|n| n.nodes.iter().find(|n| n.url_string == c.url_string))
            .and_then(|n| n.nodes.iter().find(|n| n.url_string == d.url_string));
        assert!(found.is_some());
        assert!(pending.is_empty());
    }
}
