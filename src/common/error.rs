use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Crate-wide error type.
///
/// Only the synchronous `Crawler::crawl` path and the HTTP handlers surface
/// these to a caller; everything inside the fetch pipeline absorbs its own
/// errors and only logs them.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    ClientInput(String),

    #[error("domain already registered: {0}")]
    DomainAlreadyRegistered(String),

    #[error("failed to retrieve or parse robots.txt: {0}")]
    RobotsUnavailable(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::ClientInput(_) | Error::UrlParseError(_) => StatusCode::BAD_REQUEST,
            Error::DomainAlreadyRegistered(_) => StatusCode::BAD_REQUEST,
            Error::RobotsUnavailable(_) => StatusCode::BAD_REQUEST,
            Error::HttpError(_) => StatusCode::BAD_GATEWAY,
            Error::ConfigError(_) | Error::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
