//! Multi-platform publishing dispatch.
//!
//! The dispatcher fans a finished artifact out to the target platforms with
//! independent failure domains: every target gets exactly one
//! [`vasari_core::PublicationRecord`] whether the attempt succeeded or not,
//! and partial success is a first-class outcome. Timing modes (immediate,
//! fixed datetime, provider-managed auto-schedule) are mutually exclusive
//! and validated at the request boundary, not trusted from callers.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod dispatcher;
mod http_publisher;
mod schedule;

pub use dispatcher::{PublishConfig, PublishDispatcher, resolve_timing};
pub use http_publisher::{HttpPublisher, PublisherEndpoint};
pub use schedule::next_auto_slot;
