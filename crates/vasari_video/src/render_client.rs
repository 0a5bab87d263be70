//! HTTP client for an avatar-render API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use vasari_error::{ProviderError, ProviderErrorKind, VasariResult};
use vasari_interface::{RenderState, VideoRenderRequest, VideoRenderStatus, VideoSynthesizer};

const PROVIDER: &str = "render_api";

/// Connection details for the render API, injected at construction.
#[derive(Debug, Clone)]
pub struct RenderEndpoint {
    /// Base URL of the render API
    pub base_url: String,
    /// API key sent as a bearer token
    pub api_key: String,
}

#[derive(Debug, Serialize)]
struct SubmitBody<'a> {
    script: &'a str,
    avatar_id: &'a str,
    voice_id: &'a str,
    aspect_ratio: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    task_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    video_url: Option<String>,
    thumbnail_url: Option<String>,
    duration_secs: Option<f32>,
    error: Option<String>,
}

/// [`VideoSynthesizer`] over a render provider's REST API.
#[derive(Debug, Clone)]
pub struct RenderClient {
    client: Client,
    endpoint: RenderEndpoint,
}

impl RenderClient {
    /// Create a client for the given endpoint.
    pub fn new(endpoint: RenderEndpoint) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }

    async fn check(response: reqwest::Response) -> VasariResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        if status == 401 || status == 403 {
            return Err(ProviderError::new(PROVIDER, ProviderErrorKind::Auth(message)).into());
        }
        Err(ProviderError::new(PROVIDER, ProviderErrorKind::Http { status, message }).into())
    }
}

#[async_trait]
impl VideoSynthesizer for RenderClient {
    #[instrument(skip(self, req))]
    async fn submit(&self, req: &VideoRenderRequest) -> VasariResult<String> {
        let url = format!("{}/v1/renders", self.endpoint.base_url);
        debug!(url = %url, "Submitting render");

        let body = SubmitBody {
            script: &req.script,
            avatar_id: &req.avatar.avatar_id,
            voice_id: &req.avatar.voice_id,
            aspect_ratio: req.avatar.aspect_ratio.as_ratio(),
        };

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
        let response = Self::check(response).await?;

        let submitted: SubmitResponse = response.json().await.map_err(|e| {
            ProviderError::new(PROVIDER, ProviderErrorKind::InvalidResponse(e.to_string()))
        })?;
        Ok(submitted.task_id)
    }

    #[instrument(skip(self))]
    async fn status(&self, task_id: &str) -> VasariResult<VideoRenderStatus> {
        let url = format!("{}/v1/renders/{task_id}", self.endpoint.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.endpoint.api_key)
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(PROVIDER, ProviderErrorKind::Unavailable(e.to_string()))
            })?;
        let response = Self::check(response).await?;

        let status: StatusResponse = response.json().await.map_err(|e| {
            ProviderError::new(PROVIDER, ProviderErrorKind::InvalidResponse(e.to_string()))
        })?;

        let state = match status.status.as_str() {
            "queued" | "pending" | "processing" => RenderState::Processing,
            "completed" | "done" => RenderState::Completed,
            "failed" | "error" => RenderState::Failed,
            other => {
                return Err(ProviderError::new(
                    PROVIDER,
                    ProviderErrorKind::InvalidResponse(format!("unknown render status '{other}'")),
                )
                .into());
            }
        };

        Ok(VideoRenderStatus {
            state,
            video_url: status.video_url,
            thumbnail_url: status.thumbnail_url,
            duration_secs: status.duration_secs,
            error: status.error,
        })
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}
