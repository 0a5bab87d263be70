//! Provider trait seams for the Vasari workflow orchestrator.
//!
//! The orchestrator consumes four abstract capabilities: research collection,
//! text generation, video synthesis, and social publishing. Concrete
//! providers are external collaborators implementing the traits defined here;
//! each receives its credentials and base URLs as an explicit configuration
//! object at construction, never from ambient globals.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::{ResearchProvider, SocialPublisher, VasariDriver, VideoSynthesizer};
pub use types::{PostReceipt, PostRequest, RenderState, VideoRenderRequest, VideoRenderStatus};
