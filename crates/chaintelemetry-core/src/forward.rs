//! `Forwarder` — fans blocks out to independent enrichment tasks.
//!
//! Ingestion never waits for enrichment: every block received on the channel
//! is enriched in its own task and the record lands in the sink whenever that
//! task finishes. A later block can therefore be written before an earlier
//! one.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

use crate::block::RawBlock;
use crate::enrich::Enricher;
use crate::error::TelemetryError;
use crate::record::TelemetryRecord;

/// Counters reported when the forwarder stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardStats {
    /// Blocks taken off the channel.
    pub received: u64,
    /// Records appended to the sink.
    pub written: u64,
}

pub struct Forwarder {
    enricher: Arc<Enricher>,
}

impl Forwarder {
    pub fn new(enricher: Arc<Enricher>) -> Self {
        Self { enricher }
    }

    /// Enrich every block from `blocks` until the channel closes.
    ///
    /// In-flight enrichments are drained before returning. A sink failure
    /// aborts the remaining tasks and is returned to the caller.
    pub async fn run(
        &self,
        mut blocks: mpsc::UnboundedReceiver<RawBlock>,
    ) -> Result<ForwardStats, TelemetryError> {
        let mut tasks = JoinSet::new();
        let mut stats = ForwardStats::default();

        loop {
            tokio::select! {
                block = blocks.recv() => match block {
                    Some(block) => {
                        stats.received += 1;
                        let enricher = Arc::clone(&self.enricher);
                        tasks.spawn(async move { enricher.enrich(block).await });
                    }
                    None => break,
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    settle(joined, &mut stats)?;
                }
            }
        }

        tracing::debug!(in_flight = tasks.len(), "block channel closed, draining");
        while let Some(joined) = tasks.join_next().await {
            settle(joined, &mut stats)?;
        }
        Ok(stats)
    }
}

fn settle(
    joined: Result<Result<TelemetryRecord, TelemetryError>, JoinError>,
    stats: &mut ForwardStats,
) -> Result<(), TelemetryError> {
    match joined {
        Ok(Ok(_)) => {
            stats.written += 1;
            Ok(())
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "failed to write telemetry record");
            Err(e)
        }
        Err(e) => Err(TelemetryError::Task(e.to_string())),
    }
}
