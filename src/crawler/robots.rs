use std::sync::Arc;

use reqwest::header::USER_AGENT;
use reqwest::Client;
use robotparser::model::FetchedRobotsTxt;
use robotparser::parser::parse_fetched_robots_txt;
use robotparser::service::RobotsTxtService;
use url::Url;

use crate::common::error::{Error, Result};

/// The robot exclusion policy resolved for one seed's host, matched against
/// the crawler's configured user agent.
///
/// `robotparser`'s own `reqwest` integration returns a `!Send` future (it
/// boxes a `dyn Future` with no `Send` bound), which cannot be awaited from
/// inside an `axum` handler. This fetches `robots.txt` with the crawler's
/// own client and hands the body to `parse_fetched_robots_txt` directly —
/// the same synchronous parse the crate's integration calls internally.
/// A failed fetch allows everything; a denied fetch allows nothing.
#[derive(Clone)]
pub struct RobotsPolicy {
    fetched: Arc<FetchedRobotsTxt>,
    user_agent: String,
}

impl RobotsPolicy {
    /// Fetch and parse `<seed>/robots.txt`. Propagates the transport error;
    /// a non-transport failure (404, 5xx, malformed body) is absorbed by
    /// the underlying policy model rather than failing the crawl.
    pub async fn fetch(client: &Client, seed: &Url, user_agent: &str) -> Result<Self> {
        let origin = seed.origin();
        let robots_url = origin
            .unicode_serialization()
            .parse::<Url>()
            .and_then(|base| base.join("/robots.txt"))
            .map_err(|e| Error::RobotsUnavailable(e.to_string()))?;

        let response = client
            .get(robots_url)
            .header(USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|e| Error::RobotsUnavailable(e.to_string()))?;

        let status_code = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::RobotsUnavailable(e.to_string()))?;

        let fetched = parse_fetched_robots_txt(origin, status_code, &body).get_result();

        Ok(Self {
            fetched: Arc::new(fetched),
            user_agent: user_agent.to_string(),
        })
    }

    /// Whether `url`'s path is allowed for the configured user agent.
    pub fn is_allowed(&self, url: &Url) -> bool {
        self.fetched.can_fetch(&self.user_agent, url)
    }

    /// A policy that allows every path, built without a network round trip.
    #[cfg(test)]
    pub(crate) fn allow_all(user_agent: &str) -> Self {
        let origin = Url::parse("https://example.com").unwrap().origin();
        let fetched = parse_fetched_robots_txt(origin, 404, "").get_result();
        Self {
            fetched: Arc::new(fetched),
            user_agent: user_agent.to_string(),
        }
    }

    /// A policy built from a literal `robots.txt` body, without a network
    /// round trip.
    #[cfg(test)]
    pub(crate) fn from_body(user_agent: &str, body: &str) -> Self {
        let origin = Url::parse("https://example.com").unwrap().origin();
        let fetched = parse_fetched_robots_txt(origin, 200, body).get_result();
        Self {
            fetched: Arc::new(fetched),
            user_agent: user_agent.to_string(),
        }
    }
}
