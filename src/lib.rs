//! Concurrent, same-domain web crawler with a small HTTP control plane.
//!
//! Given a seed URL and a maximum traversal depth, fetches the seed,
//! discovers in-domain links, respects the host's robots.txt, rate-limits
//! outbound fetches globally, and builds a queryable tree of discovered
//! resources.

pub mod api;
pub mod common;
pub mod crawler;

pub use common::{config::Config, error::Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::common::config::Config;
    pub use crate::common::error::{Error, Result};
    pub use crate::crawler::Crawler;
}
