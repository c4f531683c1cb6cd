//! `Enricher` — turns one `RawBlock` into one appended `TelemetryRecord`.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::block::RawBlock;
use crate::error::TelemetryError;
use crate::hex::parse_hex_u64;
use crate::record::TelemetryRecord;
use crate::sink::TelemetrySink;
use crate::transport::RpcTransport;

/// Client identity query.
pub const CLIENT_VERSION_METHOD: &str = "web3_clientVersion";

/// Connected peer count query (hex quantity).
pub const PEER_COUNT_METHOD: &str = "net_peerCount";

const QUERY_ID: u64 = 1;

/// Enriches blocks with node state and appends the result to a sink.
///
/// Holds no per-block state; one `Enricher` can serve any number of
/// overlapping `enrich` calls.
pub struct Enricher {
    transport: Arc<dyn RpcTransport>,
    sink: Arc<dyn TelemetrySink>,
}

impl Enricher {
    pub fn new(transport: Arc<dyn RpcTransport>, sink: Arc<dyn TelemetrySink>) -> Self {
        Self { transport, sink }
    }

    /// Enrich `block`, append the record and return it.
    ///
    /// Query failures degrade to sentinels; only a sink failure is an error.
    pub async fn enrich(&self, block: RawBlock) -> Result<TelemetryRecord, TelemetryError> {
        tracing::info!(block = block.number, hash = %block.hash, "got new block");

        let received_ms = now_millis();
        let (client, peers) = tokio::join!(self.query_client_version(), self.query_peer_count());

        let record = TelemetryRecord::assemble(&block, client, peers, received_ms);
        self.sink.append(&record).await?;

        tracing::debug!(
            block = record.block_num,
            peers = record.num_peers,
            txs = record.num_tx_in_block,
            "telemetry record written"
        );
        Ok(record)
    }

    /// `web3_clientVersion`, or `None` if it could not be obtained.
    pub async fn query_client_version(&self) -> Option<String> {
        match self.query(CLIENT_VERSION_METHOD).await? {
            Value::String(s) if !s.is_empty() => Some(s),
            other => {
                tracing::warn!(method = CLIENT_VERSION_METHOD, result = %other, "unexpected result");
                None
            }
        }
    }

    /// `net_peerCount` decoded from hex, or `None` if it could not be obtained.
    pub async fn query_peer_count(&self) -> Option<i64> {
        let value = self.query(PEER_COUNT_METHOD).await?;
        let decoded = value
            .as_str()
            .and_then(|hex| parse_hex_u64(hex).ok())
            .and_then(|n| i64::try_from(n).ok());
        if decoded.is_none() {
            tracing::warn!(method = PEER_COUNT_METHOD, result = %value, "unexpected result");
        }
        decoded
    }

    async fn query(&self, method: &str) -> Option<Value> {
        match self.transport.call(QUERY_ID, method, vec![]).await {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(
                    method,
                    url = %self.transport.url(),
                    error = %e,
                    "unable to query node"
                );
                None
            }
        }
    }
}

fn now_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}
