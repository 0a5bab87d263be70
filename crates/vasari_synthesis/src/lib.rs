//! Insight and script synthesis over the text-generation driver.
//!
//! Both passes here are stateless transformations: raw research items reduce
//! to a structured [`vasari_core::InsightSet`], and insights (or a bare
//! topic) become a platform-appropriate script or post body. Model output is
//! never trusted blindly: JSON is extracted defensively and platform
//! character ceilings are validated with one corrective constrained pass
//! rather than silent truncation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod extraction;
mod insight;
mod script;

pub use extraction::extract_json;
pub use insight::InsightSynthesizer;
pub use script::{ScriptParams, ScriptWriter, caption_ceiling};
