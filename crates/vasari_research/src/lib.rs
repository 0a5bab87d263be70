//! Research collection and aggregation.
//!
//! The research stage pulls raw items from one or more named sources through
//! the [`vasari_interface::ResearchProvider`] seam. The aggregator owns the
//! policy the adapters deliberately do not: bounded per-call timeouts,
//! jittered-backoff retries of transient failures, and absorption of a
//! single source's failure when other configured sources still return data.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod aggregator;
mod feed;

pub use aggregator::{ResearchAggregator, ResearchConfig};
pub use feed::{FeedEndpoint, JsonFeedProvider};
