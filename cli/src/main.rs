//! chaintelemetry — block telemetry forwarder.
//!
//! Usage:
//! ```bash
//! # Local node with defaults (ws://localhost:8545/ws/json-rpc, ./logger.txt)
//! chaintelemetry
//!
//! # Remote node, writing into a named pipe
//! WSURL=ws://node:8545/ws/json-rpc HTTPURL=http://node:8545 PIPENAME=/run/telemetry.pipe chaintelemetry
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;

use chaintelemetry_core::{Enricher, FileSink, Forwarder, TelemetrySink};
use chaintelemetry_http::HttpRpcClient;
use chaintelemetry_ws::BlockFeed;

mod config;
mod logging;

use config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();
    logging::init_tracing(&config.log());

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "telemetry forwarder stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<()> {
    tracing::info!("telemetry forwarder started");
    tracing::info!(url = %config.ws_url, "using websocket");
    tracing::info!(url = %config.http_url, "using JSON-RPC");
    let sink = FileSink::new(&config.sink);
    tracing::info!(sink = %sink.describe(), "writing to sink");

    let transport = HttpRpcClient::new(&config.http_url, config.http())
        .context("failed to create JSON-RPC client")?;
    let enricher = Arc::new(Enricher::new(Arc::new(transport), Arc::new(sink)));
    let forwarder = Forwarder::new(enricher);

    let feed = BlockFeed::new(&config.ws_url, config.feed());
    let (tx, rx) = mpsc::unbounded_channel();

    let mut feed_task = tokio::spawn(async move { feed.run(tx).await });
    let forward = forwarder.run(rx);
    tokio::pin!(forward);

    // Whichever side stops first decides the outcome. When the feed stops
    // its sender is dropped and the forwarder drains in-flight records.
    let feed_result = tokio::select! {
        stats = &mut forward => {
            feed_task.abort();
            let stats = stats.context("telemetry sink failed")?;
            tracing::info!(received = stats.received, written = stats.written, "forwarder stopped");
            return Ok(());
        }
        joined = &mut feed_task => joined.context("block feed task panicked")?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received, shutting down");
            feed_task.abort();
            Ok(())
        }
    };

    let stats = forward.await.context("telemetry sink failed")?;
    tracing::info!(received = stats.received, written = stats.written, "forwarder stopped");

    feed_result.context("block feed stopped")
}
