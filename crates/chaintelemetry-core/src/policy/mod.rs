//! Reliability policies.
//!
//! Auxiliary queries are never retried; the only policy in use is the
//! backoff applied between feed reconnect attempts.

pub mod retry;

pub use retry::{RetryConfig, RetryPolicy};
