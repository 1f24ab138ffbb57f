use config::{Environment, File};
use serde::{Deserialize, Serialize};

use crate::common::error::Result;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CrawlerConfig {
    /// Default max depth substituted when a client posts `depth: 0`.
    pub max_depth: usize,

    /// Global throttle: maximum number of fetches in flight process-wide.
    pub throttle_capacity: usize,

    /// Bounded capacity of the discovery-to-fetch queue.
    pub queue_capacity: usize,

    /// User agent sent with every outbound request and matched against
    /// robots.txt groups.
    pub user_agent: String,

    /// Request timeout in seconds for HEAD/GET fetches.
    pub timeout_seconds: u64,

    /// Idle window after which a Worker with no tree updates is declared
    /// complete.
    pub quiescence_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    /// API server bind host
    pub host: String,

    /// API server bind port
    pub port: u16,

    /// Enable permissive CORS on the control plane
    pub enable_cors: bool,

    /// Graceful shutdown deadline for the HTTP server, in seconds
    pub shutdown_deadline_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            crawler: CrawlerConfig {
                max_depth: 5,
                throttle_capacity: 20,
                queue_capacity: 100,
                user_agent: "GoCrawler/v0.1 (+https://github.com/q/gocrawler)".to_string(),
                timeout_seconds: 30,
                quiescence_seconds: 15,
            },
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                enable_cors: true,
                shutdown_deadline_seconds: 10,
            },
        }
    }
}

impl Config {
    /// Load configuration layered as: built-in defaults, then an optional
    /// config file, then `CRAWLER_*`-prefixed environment variables. `.env`
    /// is read (if present) before the environment layer is applied so that
    /// local overrides behave the same whether exported or file-based.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let _ = dotenv::dotenv();

        let defaults = Config::default();
        let mut builder = config::Config::builder()
            .set_default("crawler.max_depth", defaults.crawler.max_depth as i64)?
            .set_default(
                "crawler.throttle_capacity",
                defaults.crawler.throttle_capacity as i64,
            )?
            .set_default(
                "crawler.queue_capacity",
                defaults.crawler.queue_capacity as i64,
            )?
            .set_default("crawler.user_agent", defaults.crawler.user_agent.clone())?
            .set_default(
                "crawler.timeout_seconds",
                defaults.crawler.timeout_seconds as i64,
            )?
            .set_default(
                "crawler.quiescence_seconds",
                defaults.crawler.quiescence_seconds as i64,
            )?
            .set_default("api.host", defaults.api.host.clone())?
            .set_default("api.port", defaults.api.port as i64)?
            .set_default("api.enable_cors", defaults.api.enable_cors)?
            .set_default(
                "api.shutdown_deadline_seconds",
                defaults.api.shutdown_deadline_seconds as i64,
            )?;

        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(true));
        } else {
            builder = builder.add_source(File::with_name("crawler").required(false));
        }

        builder = builder.add_source(Environment::with_prefix("CRAWLER").separator("__"));

        Ok(builder.build()?.try_deserialize()?)
    }
}
