//! chaintelemetry-ws — WebSocket block feed.
//!
//! # Features
//! - Polls `eth_getBlockByNumber("latest")` on a fixed interval
//! - Decodes replies into [`RawBlock`](chaintelemetry_core::RawBlock)s, skipping bad frames
//! - Reconnects with exponential backoff, bounded by a retry budget
//! - Publishes its connection state through a `watch` channel

pub mod feed;

pub use feed::{parse_feed_message, BlockFeed, FeedConfig, FeedError, FeedState};
