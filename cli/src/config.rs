//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use chaintelemetry_core::policy::RetryConfig;
use chaintelemetry_http::HttpClientConfig;
use chaintelemetry_ws::FeedConfig;

use crate::logging::LogConfig;

#[derive(Debug, Parser)]
#[command(
    name = "chaintelemetry",
    about = "Stream new blocks from a node into an append-only telemetry sink",
    long_about = "
Polls the node's WebSocket endpoint for the latest block, enriches every
block with the client version and peer count from the JSON-RPC endpoint and
appends one JSON line per block to the sink (file or named pipe).

ENVIRONMENT VARIABLES:
  WSURL      WebSocket endpoint
  HTTPURL    JSON-RPC endpoint
  PIPENAME   Sink path
  RUST_LOG   Log filter, overrides --log-level
",
    version
)]
pub struct Config {
    /// WebSocket JSON-RPC endpoint of the node
    #[arg(long, env = "WSURL", default_value = "ws://localhost:8545/ws/json-rpc")]
    pub ws_url: String,

    /// HTTP JSON-RPC endpoint of the node
    #[arg(long, env = "HTTPURL", default_value = "http://localhost:8545")]
    pub http_url: String,

    /// File or named pipe receiving telemetry records
    #[arg(long, env = "PIPENAME", default_value = "./logger.txt")]
    pub sink: PathBuf,

    /// Milliseconds between latest-block polls
    #[arg(long, default_value_t = 1_000)]
    pub poll_interval_ms: u64,

    /// Consecutive feed failures tolerated before exiting (0 = never reconnect)
    #[arg(long, default_value_t = 5)]
    pub max_reconnects: u32,

    /// Timeout for auxiliary JSON-RPC queries, in seconds
    #[arg(long, default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Default log level
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Emit JSON logs
    #[arg(long)]
    pub log_json: bool,
}

impl Config {
    pub fn feed(&self) -> FeedConfig {
        FeedConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            reconnect: RetryConfig {
                max_retries: self.max_reconnects,
                ..RetryConfig::default()
            },
        }
    }

    pub fn http(&self) -> HttpClientConfig {
        HttpClientConfig {
            request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
        }
    }

    pub fn log(&self) -> LogConfig {
        LogConfig {
            level: self.log_level.clone(),
            json: self.log_json,
        }
    }
}
