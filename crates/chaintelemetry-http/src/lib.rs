//! chaintelemetry-http — HTTP JSON-RPC transport for auxiliary node queries.
//!
//! Requests are sent once: a failed query is reported to the caller, which
//! substitutes a sentinel value instead of retrying.

pub mod client;

pub use client::{HttpClientConfig, HttpRpcClient};
