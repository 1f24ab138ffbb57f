use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crawltrace::api;
use crawltrace::common::config::Config;
use crawltrace::crawler::Crawler;
use tracing::info;

/// Concurrent, same-domain web crawler with a small HTTP control plane.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to a layered config file (defaults to `crawler.{toml,yaml,json}` if present)
    #[arg(long)]
    config: Option<String>,

    /// API bind host
    #[arg(long)]
    host: Option<String>,

    /// API bind port
    #[arg(long)]
    port: Option<u16>,

    /// User agent sent with outbound requests and matched against robots.txt
    #[arg(long)]
    user_agent: Option<String>,

    /// Default max crawl depth
    #[arg(long)]
    max_depth: Option<usize>,

    /// Global concurrent-fetch throttle capacity
    #[arg(long)]
    throttle: Option<usize>,

    /// Discovery-to-fetch queue capacity
    #[arg(long)]
    queue_capacity: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;

    if let Some(host) = args.host {
        config.api.host = host;
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(user_agent) = args.user_agent {
        config.crawler.user_agent = user_agent;
    }
    if let Some(max_depth) = args.max_depth {
        config.crawler.max_depth = max_depth;
    }
    if let Some(throttle) = args.throttle {
        config.crawler.throttle_capacity = throttle;
    }
    if let Some(queue_capacity) = args.queue_capacity {
        config.crawler.queue_capacity = queue_capacity;
    }

    let shutdown_deadline = Duration::from_secs(config.api.shutdown_deadline_seconds);
    let enable_cors = config.api.enable_cors;
    let bind_addr = format!("{}:{}", config.api.host, config.api.port);

    let crawler = Arc::new(Crawler::new(config.crawler));
    let app = api::router(Arc::clone(&crawler), enable_cors);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "listening");

    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel();
    let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = signalled_tx.send(());
    });

    tokio::select! {
        result = serve => {
            if let Err(e) = result {
                tracing::error!(error = %e, "server error");
            }
        }
        _ = async move {
            let _ = signalled_rx.await;
            tokio::time::sleep(shutdown_deadline).await;
        } => {
            tracing::warn!("graceful shutdown deadline elapsed, forcing close");
        }
    }

    info!("draining outstanding fetches");
    crawler.close().await;
    info!("shutdown complete");

    Ok(())
}

/// Resolves once SIGINT, SIGTERM, or SIGQUIT is received, triggering
/// `axum`'s graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut sigquit = signal(SignalKind::quit()).expect("failed to install SIGQUIT handler");
        tokio::select! {
            _ = sigterm.recv() => {},
            _ = sigquit.recv() => {},
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
