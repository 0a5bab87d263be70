//! Request and response types for text generation.

use serde::{Deserialize, Serialize};

/// Role of a message in a generation conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Instructions framing the task
    System,
    /// Caller-supplied content
    User,
    /// Model output fed back as context
    Assistant,
}

/// One message in a generation conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who produced the message
    pub role: Role,
    /// The message text
    pub content: String,
}

impl Message {
    /// Shorthand for a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Shorthand for a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A text generation request.
///
/// # Examples
///
/// ```
/// use vasari_core::{GenerateRequest, Message};
///
/// let request = GenerateRequest {
///     messages: vec![Message::user("Summarize these items")],
///     max_tokens: Some(512),
///     temperature: Some(0.7),
///     model: None,
/// };
/// assert_eq!(request.messages.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GenerateRequest {
    /// The conversation messages to send
    pub messages: Vec<Message>,
    /// Maximum number of tokens to generate
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0.0 to 1.0)
    pub temperature: Option<f32>,
    /// Model identifier to use
    pub model: Option<String>,
}

/// The generated output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The generated text
    pub text: String,
    /// The model that produced it
    pub model: String,
}
