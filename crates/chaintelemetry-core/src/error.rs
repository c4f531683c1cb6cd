//! Error types for the telemetry pipeline.

use thiserror::Error;

use crate::request::JsonRpcError;

/// Errors that can occur during an RPC transport operation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed (connection refused, timeout, non-2xx, bad body).
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON-RPC protocol-level error returned by the node.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),

    /// The node answered without a `result`.
    #[error("empty result for {method}")]
    EmptyResult { method: String },
}

/// A hex quantity could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexError {
    #[error("empty hex quantity")]
    Empty,

    #[error("invalid hex quantity '{0}'")]
    Invalid(String),

    #[error("hex quantity '{0}' overflows u64")]
    Overflow(String),
}

/// Writing a record to the sink failed.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to open sink {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write to sink {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors surfaced by the enrichment pipeline.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("enrichment task failed: {0}")]
    Task(String),
}
