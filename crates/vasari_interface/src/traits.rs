//! Trait definitions for the external provider capabilities.

use crate::{PostReceipt, PostRequest, VideoRenderRequest, VideoRenderStatus};
use async_trait::async_trait;
use vasari_core::{
    AnalysisDepth, Engagement, GenerateRequest, GenerateResponse, Platform, RawItem,
    ResearchSource,
};
use vasari_error::VasariResult;

/// Core trait every text-generation backend must implement.
///
/// Used for both insight synthesis and script/post writing. Determinism is
/// not guaranteed; callers treat outputs as model-based and validate them.
#[async_trait]
pub trait VasariDriver: Send + Sync {
    /// Generate model output for the given request.
    async fn generate(&self, req: &GenerateRequest) -> VasariResult<GenerateResponse>;

    /// Provider name (e.g. "anthropic", "gemini", "local").
    fn provider_name(&self) -> &'static str;

    /// Default model identifier used when a request does not override it.
    fn model_name(&self) -> &str;
}

/// A named research source.
///
/// `max_items` bounds cost; `depth` is passed through to the provider and
/// never interpreted here. Implementations surface failures as typed
/// [`vasari_error::ProviderError`]s and never retry internally; the retry
/// policy belongs to the aggregation layer driving the adapter.
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    /// Pull up to `max_items` raw items matching the query.
    async fn collect(
        &self,
        query: &str,
        max_items: u32,
        depth: AnalysisDepth,
    ) -> VasariResult<Vec<RawItem>>;

    /// The source this provider serves.
    fn source(&self) -> ResearchSource;
}

/// An asynchronous video-rendering provider.
///
/// Submission returns immediately with a provider job id; completion is
/// observed by polling [`VideoSynthesizer::status`].
#[async_trait]
pub trait VideoSynthesizer: Send + Sync {
    /// Submit a render job; returns the provider task id.
    async fn submit(&self, req: &VideoRenderRequest) -> VasariResult<String>;

    /// Report the current state of a submitted job.
    async fn status(&self, task_id: &str) -> VasariResult<VideoRenderStatus>;

    /// Provider name, for error attribution.
    fn provider_name(&self) -> &'static str;
}

/// A social-publishing provider for one platform.
#[async_trait]
pub trait SocialPublisher: Send + Sync {
    /// Publish a post with the requested timing.
    async fn post(&self, req: &PostRequest) -> VasariResult<PostReceipt>;

    /// Fetch current engagement counters for a published post.
    async fn fetch_engagement(&self, platform_post_id: &str) -> VasariResult<Engagement>;

    /// The platform this publisher serves.
    fn platform(&self) -> Platform;
}
