use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use url::Url;

use crate::common::error::Result;

/// Result of the GET phase of the fetch pipeline.
pub struct FetchOutcome {
    pub status_code: u16,
    pub body: String,
}

/// HEAD-probe `url`'s `Content-Type`. Returns `true` only for `text/html`.
pub async fn probe_html(
    client: &Client,
    url: &Url,
    user_agent: &str,
    timeout: Duration,
) -> Result<bool> {
    let response = client
        .head(url.clone())
        .header(USER_AGENT, user_agent)
        .timeout(timeout)
        .send()
        .await?;

    let is_html = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|content_type| content_type.contains("text/html"))
        .unwrap_or(false);

    Ok(is_html)
}

/// GET `url` and return its status code and body.
pub async fn get(
    client: &Client,
    url: &Url,
    user_agent: &str,
    timeout: Duration,
) -> Result<FetchOutcome> {
    let response = client
        .get(url.clone())
        .header(USER_AGENT, user_agent)
        .timeout(timeout)
        .send()
        .await?;

    let status_code = response.status().as_u16();
    let body = response.text().await?;

    Ok(FetchOutcome { status_code, body })
}
