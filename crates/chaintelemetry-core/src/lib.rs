//! chaintelemetry-core — block enrichment pipeline for ChainTelemetry.
//!
//! # Overview
//!
//! ChainTelemetry watches a node's latest block, enriches every block it
//! sees with auxiliary node state and appends one flat JSON record per block
//! to an append-only sink. The core crate defines:
//!
//! - [`RpcTransport`] — the async trait the auxiliary query transport implements
//! - [`JsonRpcRequest`] / [`JsonRpcResponse`] — wire types
//! - [`RawBlock`] / [`TelemetryRecord`] — pipeline input and output
//! - [`Enricher`] — turns one block into one appended record
//! - [`Forwarder`] — dispatches enrichments without blocking ingestion
//! - [`sink`] module — `TelemetrySink` trait, file and in-memory sinks
//! - [`policy`] module — reconnect backoff

pub mod block;
pub mod enrich;
pub mod error;
pub mod forward;
pub mod hex;
pub mod policy;
pub mod record;
pub mod request;
pub mod sink;
pub mod transport;

pub use block::RawBlock;
pub use enrich::{Enricher, CLIENT_VERSION_METHOD, PEER_COUNT_METHOD};
pub use error::{HexError, SinkError, TelemetryError, TransportError};
pub use forward::{ForwardStats, Forwarder};
pub use record::TelemetryRecord;
pub use request::{JsonRpcRequest, JsonRpcResponse, RpcId};
pub use sink::{FileSink, MemorySink, TelemetrySink};
pub use transport::RpcTransport;
