//! Text-generation provider clients.
//!
//! The orchestrator consumes text generation through the
//! [`vasari_interface::VasariDriver`] seam; this crate ships the concrete
//! client for OpenAI-compatible chat completion APIs, which covers most
//! hosted and local serving stacks.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod chat;

pub use chat::{ChatClient, ChatEndpoint};
