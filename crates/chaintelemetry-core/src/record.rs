//! `TelemetryRecord` — the flat record appended to the sink for every block.

use serde::{Deserialize, Serialize};

use crate::block::RawBlock;

/// Placeholder for an unknown client identity.
pub const CLIENT_UNKNOWN: &str = "N/A";

/// Placeholder for an unknown peer count.
pub const PEERS_UNKNOWN: i64 = -1;

/// One enriched block, serialized as a single JSON line.
///
/// Field order is the serialized order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryRecord {
    /// Client version string, or `"N/A"`.
    pub client: String,
    pub block_num: u64,
    pub block_hash: String,
    /// Block timestamp, seconds since epoch.
    pub block_ts: u64,
    /// Wall clock at enrichment start, milliseconds since epoch.
    pub block_received: u64,
    /// Same instant as `block_received`.
    pub timekey: u64,
    /// Connected peers, or `-1`.
    pub num_peers: i64,
    pub num_tx_in_block: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
}

impl TelemetryRecord {
    /// Build a record from a block and the auxiliary query results.
    ///
    /// Absent query results are replaced by their sentinels.
    pub fn assemble(
        block: &RawBlock,
        client: Option<String>,
        num_peers: Option<i64>,
        received_ms: u64,
    ) -> Self {
        Self {
            client: client.unwrap_or_else(|| CLIENT_UNKNOWN.to_string()),
            block_num: block.number,
            block_hash: block.hash.clone(),
            block_ts: block.timestamp,
            block_received: received_ms,
            timekey: received_ms,
            num_peers: num_peers.unwrap_or(PEERS_UNKNOWN),
            num_tx_in_block: block.tx_count() as u64,
            gas_limit: block.gas_limit,
            gas_used: block.gas_used,
        }
    }

    /// Serialize as one newline-terminated JSON line.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(txs: usize) -> RawBlock {
        RawBlock {
            number: 10,
            hash: "0xabc".into(),
            timestamp: 100_000_000,
            transactions: vec![serde_json::Value::from(1); txs],
            gas_limit: 8_000_000,
            gas_used: 21_000,
        }
    }

    #[test]
    fn assemble_with_query_results() {
        let rec = TelemetryRecord::assemble(&block(2), Some("TestClient/1.0".into()), Some(5), 42);
        assert_eq!(rec.client, "TestClient/1.0");
        assert_eq!(rec.block_num, 10);
        assert_eq!(rec.block_hash, "0xabc");
        assert_eq!(rec.block_ts, 100_000_000);
        assert_eq!(rec.block_received, 42);
        assert_eq!(rec.timekey, 42);
        assert_eq!(rec.num_peers, 5);
        assert_eq!(rec.num_tx_in_block, 2);
        assert_eq!(rec.gas_limit, 8_000_000);
        assert_eq!(rec.gas_used, 21_000);
    }

    #[test]
    fn assemble_uses_sentinels() {
        let rec = TelemetryRecord::assemble(&block(0), None, None, 1);
        assert_eq!(rec.client, "N/A");
        assert_eq!(rec.num_peers, -1);
        assert_eq!(rec.num_tx_in_block, 0);
    }

    #[test]
    fn block_fields_do_not_depend_on_clock() {
        let a = TelemetryRecord::assemble(&block(3), None, None, 1);
        let b = TelemetryRecord::assemble(&block(3), None, None, 2);
        assert_eq!(
            (a.block_num, &a.block_hash, a.block_ts, a.num_tx_in_block, a.gas_limit, a.gas_used),
            (b.block_num, &b.block_hash, b.block_ts, b.num_tx_in_block, b.gas_limit, b.gas_used)
        );
    }

    #[test]
    fn line_has_stable_field_order() {
        let rec = TelemetryRecord::assemble(&block(2), Some("Geth".into()), Some(5), 7);
        assert_eq!(
            rec.to_line().unwrap(),
            "{\"client\":\"Geth\",\"blockNum\":10,\"blockHash\":\"0xabc\",\"blockTs\":100000000,\
             \"blockReceived\":7,\"timekey\":7,\"numPeers\":5,\"numTxInBlock\":2,\
             \"gasLimit\":8000000,\"gasUsed\":21000}\n"
        );
    }
}
