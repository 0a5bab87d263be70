//! Video synthesis orchestration.
//!
//! The canonical asynchronous-job pattern: submission returns immediately
//! with a provider task id, and completion is observed through a resumable
//! polling step that persists `last_polled_at` and the provider state on the
//! task row. Nothing here parks a worker for the render duration; a single
//! process can service many in-flight workflows by re-invoking
//! [`VideoOrchestrator::poll_step`] on its schedule of choice.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod orchestrator;
mod render_client;

pub use orchestrator::{VideoConfig, VideoOrchestrator, VideoPoll};
pub use render_client::{RenderClient, RenderEndpoint};
