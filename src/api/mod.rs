use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::crawler::{Crawler, Status};

/// Builds the control-plane router: the three domain endpoints plus a
/// liveness probe, wrapped in request tracing and optional CORS.
pub fn router(crawler: Arc<Crawler>, enable_cors: bool) -> Router {
    let router = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/domains", post(register_domain))
        .route("/api/domains/:domain", get(get_tree))
        .route("/api/domains/:domain/status", get(get_status))
        .with_state(crawler)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Deserialize)]
struct CrawlRequest {
    domain: String,
    depth: Option<usize>,
}

#[derive(Debug, Serialize)]
struct CrawlResponse {
    domain: String,
    depth: usize,
    status: &'static str,
}

/// `POST /api/domains`. Content-type gating and JSON-parse errors are
/// handled by `Json`'s own rejection, which already resolves to 415 for a
/// missing/incorrect content type and 400 for a malformed body.
async fn register_domain(
    State(crawler): State<Arc<Crawler>>,
    Json(request): Json<CrawlRequest>,
) -> Response {
    match crawler.crawl(&request.domain, request.depth.unwrap_or(0)).await {
        Ok((domain, depth)) => (
            StatusCode::ACCEPTED,
            Json(CrawlResponse {
                domain,
                depth,
                status: "initialised",
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    domain: String,
    depth: usize,
    status: &'static str,
}

/// `GET /api/domains/:domain/status`.
async fn get_status(State(crawler): State<Arc<Crawler>>, Path(domain): Path<String>) -> Response {
    match crawler.worker(&domain) {
        Some(worker) => (
            StatusCode::OK,
            Json(StatusResponse {
                domain,
                depth: worker.crawl_depth,
                status: worker.status().as_str(),
            }),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// `GET /api/domains/:domain`: the tree as a single-element array once the
/// Worker is complete, `204` while still running, `404` if unknown.
async fn get_tree(State(crawler): State<Arc<Crawler>>, Path(domain): Path<String>) -> Response {
    let Some(worker) = crawler.worker(&domain) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    if worker.status() != Status::Complete {
        return StatusCode::NO_CONTENT.into_response();
    }

    match worker.tree_snapshot() {
        Some(root) => (StatusCode::OK, Json([root])).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
