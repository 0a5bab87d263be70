//! OpenAI-compatible chat completion client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use vasari_core::{GenerateRequest, GenerateResponse, Role};
use vasari_error::{ProviderError, ProviderErrorKind, VasariResult};
use vasari_interface::VasariDriver;

const PROVIDER: &str = "chat_api";

/// Connection details for a chat completion endpoint.
///
/// Injected at construction; the client holds no ambient configuration.
#[derive(Debug, Clone)]
pub struct ChatEndpoint {
    /// Base URL up to (not including) `/chat/completions`
    pub base_url: String,
    /// API key sent as a bearer token
    pub api_key: String,
    /// Default model used when a request does not override it
    pub model: String,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: Option<String>,
    choices: Vec<ChatChoice>,
}

/// [`VasariDriver`] over an OpenAI-compatible chat completion API.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    endpoint: ChatEndpoint,
}

impl ChatClient {
    /// Create a client for the given endpoint.
    pub fn new(endpoint: ChatEndpoint) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

#[async_trait]
impl VasariDriver for ChatClient {
    #[instrument(skip(self, req))]
    async fn generate(&self, req: &GenerateRequest) -> VasariResult<GenerateResponse> {
        let model = req.model.as_deref().unwrap_or(&self.endpoint.model);
        let body = ChatBody {
            model,
            messages: req
                .messages
                .iter()
                .map(|m| ChatMessage {
                    role: role_name(m.role),
                    content: &m.content,
                })
                .collect(),
            max_tokens: req.max_tokens,
            temperature: req.temperature,
        };

        let url = format!("{}/chat/completions", self.endpoint.base_url);
        debug!(url = %url, model = %model, "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.endpoint.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(PROVIDER, ProviderErrorKind::Unavailable(e.to_string()))
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            let kind = match status {
                401 | 403 => ProviderErrorKind::Auth(message),
                429 => ProviderErrorKind::RateLimited(message),
                _ => ProviderErrorKind::Http { status, message },
            };
            return Err(ProviderError::new(PROVIDER, kind).into());
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            ProviderError::new(PROVIDER, ProviderErrorKind::InvalidResponse(e.to_string()))
        })?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                ProviderError::new(
                    PROVIDER,
                    ProviderErrorKind::InvalidResponse("response carried no choices".to_string()),
                )
            })?;

        Ok(GenerateResponse {
            text,
            model: parsed.model.unwrap_or_else(|| model.to_string()),
        })
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    fn model_name(&self) -> &str {
        &self.endpoint.model
    }
}
