//! Script and post-body writing with platform constraint validation.

use crate::extract_json;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, warn};
use vasari_core::{
    ContentType, GenerateRequest, InsightSet, Message, Platform, ScriptDraft,
};
use vasari_error::{ProviderError, ProviderErrorKind, TimeoutError, VasariResult};
use vasari_interface::VasariDriver;

/// The tightest caption/body ceiling across the target platforms.
///
/// Content is validated against the strictest target so one draft can serve
/// every platform in the fan-out.
pub fn caption_ceiling(platforms: &[Platform]) -> usize {
    platforms
        .iter()
        .map(|p| p.caption_limit())
        .min()
        .unwrap_or(usize::MAX)
}

/// Parameters for one writing pass.
#[derive(Debug, Clone)]
pub struct ScriptParams {
    /// Kind of content to produce
    pub content_type: ContentType,
    /// Target platforms; their tightest ceiling bounds the body
    pub platforms: Vec<Platform>,
    /// Voice/tone for the content
    pub tone: String,
    /// Audience the content is written for
    pub audience: String,
    /// Requested spoken duration for video scripts
    pub target_duration_secs: Option<u32>,
    /// Model override
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DraftPayload {
    title: String,
    content: String,
}

/// Writes a platform-appropriate script or post body.
///
/// Output length is validated against the strictest platform ceiling before
/// hand-off; a violation triggers exactly one corrective constrained pass.
/// The draft is never silently truncated, which would corrupt meaning.
pub struct ScriptWriter {
    driver: Arc<dyn VasariDriver>,
    timeout: Duration,
}

impl ScriptWriter {
    /// Create a writer over the given driver.
    pub fn new(driver: Arc<dyn VasariDriver>, timeout: Duration) -> Self {
        Self { driver, timeout }
    }

    /// Write content for the topic, optionally grounded in insights.
    #[instrument(skip(self, insights), fields(topic = %topic, content_type = %params.content_type))]
    pub async fn write(
        &self,
        topic: &str,
        insights: Option<&InsightSet>,
        params: &ScriptParams,
    ) -> VasariResult<ScriptDraft> {
        let ceiling = caption_ceiling(&params.platforms);

        let draft = self
            .generate_draft(topic, insights, params, None)
            .await?;
        if draft.content.chars().count() <= ceiling {
            return Ok(draft);
        }

        // One corrective constrained pass, never truncation.
        warn!(
            length = draft.content.chars().count(),
            ceiling,
            "Draft exceeds platform ceiling, regenerating constrained"
        );
        let corrected = self
            .generate_draft(topic, insights, params, Some(ceiling))
            .await?;
        if corrected.content.chars().count() <= ceiling {
            return Ok(corrected);
        }

        Err(ProviderError::new(
            self.driver.provider_name(),
            ProviderErrorKind::InvalidResponse(format!(
                "content still exceeds the {ceiling}-character platform ceiling after a constrained pass"
            )),
        )
        .into())
    }

    /// Advisory quality score in [0, 1] for a draft.
    ///
    /// Structural heuristics only; stored alongside the artifact and never
    /// consulted for control flow.
    pub fn score(&self, draft: &ScriptDraft, insights: Option<&InsightSet>) -> f32 {
        let mut score: f32 = 0.0;
        if !draft.title.trim().is_empty() {
            score += 0.25;
        }
        let words = draft.content.split_whitespace().count();
        if words >= 30 {
            score += 0.25;
        }
        if words >= 80 {
            score += 0.25;
        }
        if let Some(insights) = insights {
            let content = draft.content.to_lowercase();
            let covered = insights
                .themes
                .iter()
                .filter(|theme| content.contains(&theme.to_lowercase()))
                .count();
            if covered > 0 {
                score += 0.25;
            }
        } else {
            score += 0.25;
        }
        score.clamp(0.0, 1.0)
    }

    async fn generate_draft(
        &self,
        topic: &str,
        insights: Option<&InsightSet>,
        params: &ScriptParams,
        ceiling: Option<usize>,
    ) -> VasariResult<ScriptDraft> {
        let request = GenerateRequest {
            messages: vec![
                Message::system(
                    "You write short-form social content. Respond with ONLY valid JSON \
                     of the shape {\"title\": string, \"content\": string}.",
                ),
                Message::user(build_prompt(topic, insights, params, ceiling)),
            ],
            max_tokens: Some(1024),
            temperature: Some(0.8),
            model: params.model.clone(),
        };

        let response = tokio::time::timeout(self.timeout, self.driver.generate(&request))
            .await
            .map_err(|_| TimeoutError::new("script synthesis", self.timeout.as_secs()))??;

        let provider = self.driver.provider_name();
        let json = extract_json(&response.text).ok_or_else(|| {
            ProviderError::new(
                provider,
                ProviderErrorKind::InvalidResponse("no JSON in script response".to_string()),
            )
        })?;
        let payload: DraftPayload = serde_json::from_str(&json).map_err(|e| {
            ProviderError::new(
                provider,
                ProviderErrorKind::InvalidResponse(format!("malformed script JSON: {e}")),
            )
        })?;

        Ok(ScriptDraft {
            title: payload.title,
            content: payload.content,
            content_type: params.content_type,
        })
    }
}

fn build_prompt(
    topic: &str,
    insights: Option<&InsightSet>,
    params: &ScriptParams,
    ceiling: Option<usize>,
) -> String {
    let mut prompt = format!(
        "Write a {} about \"{topic}\".\nTone: {}\nAudience: {}\n",
        match params.content_type {
            ContentType::VideoScript => "spoken-word script for a short-form video",
            ContentType::SocialPost => "social media post",
        },
        params.tone,
        params.audience,
    );
    if let Some(duration) = params.target_duration_secs {
        prompt.push_str(&format!("Target spoken duration: about {duration} seconds.\n"));
    }
    if let Some(ceiling) = ceiling {
        prompt.push_str(&format!(
            "HARD LIMIT: the content field must be under {ceiling} characters. \
             Tighten the piece rather than trail off.\n"
        ));
    }
    if let Some(insights) = insights {
        prompt.push_str(&format!("\nResearch summary: {}\n", insights.summary));
        if !insights.themes.is_empty() {
            prompt.push_str(&format!("Themes: {}\n", insights.themes.join(", ")));
        }
        if !insights.recommendations.is_empty() {
            prompt.push_str(&format!(
                "Angles worth taking: {}\n",
                insights.recommendations.join("; ")
            ));
        }
    }
    prompt
}
