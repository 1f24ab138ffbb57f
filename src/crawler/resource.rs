use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use url::Url;

/// One discovered page and its place in the tree.
///
/// `root`, `parent` and `last_fetched` are tracking fields used to place the
/// Resource in its Worker's tree; they are deliberately excluded from the
/// public JSON shape (see `Resource`'s `Serialize` impl).
#[derive(Debug, Clone)]
pub struct Resource {
    pub url: Url,
    pub url_string: String,
    pub title: String,
    pub http_status_code: u16,
    pub root: Url,
    pub parent: Vec<String>,
    pub depth: usize,
    pub nodes: Vec<Resource>,
    pub last_fetched: DateTime<Utc>,
}

impl Resource {
    /// The depth-1 Resource seeding a Worker's crawl.
    pub fn seed(url: Url) -> Self {
        let url_string = url.to_string();
        Self {
            root: url.clone(),
            url,
            url_string,
            title: String::new(),
            http_status_code: 0,
            parent: Vec::new(),
            depth: 1,
            nodes: Vec::new(),
            last_fetched: Utc::now(),
        }
    }

    /// A child discovered while fetching `parent`. `Parent` is `parent`'s
    /// ancestry extended by `parent`'s own URL string; `Depth` is
    /// `parent.depth + 1`.
    pub fn child_of(parent: &Resource, url: Url) -> Self {
        let url_string = url.to_string();
        let mut ancestry = parent.parent.clone();
        ancestry.push(parent.url_string.clone());
        Self {
            root: parent.root.clone(),
            url,
            url_string,
            title: String::new(),
            http_status_code: 0,
            parent: ancestry,
            depth: parent.depth + 1,
            nodes: Vec::new(),
            last_fetched: Utc::now(),
        }
    }
}

impl Serialize for Resource {
    /// `{url, title, status, depth, nodes}` — `status` here is the HTTP
    /// status code observed for this Resource, not the owning Worker's
    /// lifecycle status.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("Resource", 5)?;
        state.serialize_field("url", &self.url_string)?;
        state.serialize_field("title", &self.title)?;
        state.serialize_field("status", &self.http_status_code)?;
        state.serialize_field("depth", &self.depth)?;
        state.serialize_field("nodes", &self.nodes)?;
        state.end()
    }
}
