//! `RawBlock` — the minimally decoded block taken from a feed reply.

use serde::Deserialize;
use serde_json::Value;

use crate::hex;

/// Block data as returned by `eth_getBlockByNumber`.
///
/// Only the fields the telemetry record needs are decoded; everything else
/// in the payload is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBlock {
    #[serde(deserialize_with = "hex::deserialize_u64")]
    pub number: u64,
    pub hash: String,
    #[serde(deserialize_with = "hex::deserialize_u64")]
    pub timestamp: u64,
    /// Transaction hashes or objects; only the count is used.
    pub transactions: Vec<Value>,
    #[serde(deserialize_with = "hex::deserialize_u64")]
    pub gas_limit: u64,
    #[serde(deserialize_with = "hex::deserialize_u64")]
    pub gas_used: u64,
}

impl RawBlock {
    /// Decode a block from the `result` value of a feed reply.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Number of transactions in the block.
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_block_payload() {
        let block = RawBlock::from_value(json!({
            "number": "0xa",
            "hash": "0xabc",
            "parentHash": "0x123",
            "timestamp": "0x5f5e100",
            "transactions": ["0x01", "0x02"],
            "gasLimit": "0x7a1200",
            "gasUsed": "0x5208"
        }))
        .unwrap();
        assert_eq!(block.number, 10);
        assert_eq!(block.hash, "0xabc");
        assert_eq!(block.timestamp, 100_000_000);
        assert_eq!(block.tx_count(), 2);
        assert_eq!(block.gas_limit, 8_000_000);
        assert_eq!(block.gas_used, 21_000);
    }

    #[test]
    fn missing_field_is_an_error() {
        let err = RawBlock::from_value(json!({
            "number": "0xa",
            "hash": "0xabc",
            "timestamp": "0x1",
            "transactions": []
        }));
        assert!(err.is_err());
    }

    #[test]
    fn bad_hex_is_an_error() {
        let err = RawBlock::from_value(json!({
            "number": "latest",
            "hash": "0xabc",
            "timestamp": "0x1",
            "transactions": [],
            "gasLimit": "0x1",
            "gasUsed": "0x0"
        }));
        assert!(err.is_err());
    }
}
