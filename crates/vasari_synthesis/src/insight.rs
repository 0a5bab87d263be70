//! Reduction of raw research items into a structured insight set.

use crate::extract_json;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;
use vasari_core::{AnalysisDepth, GenerateRequest, InsightSet, Message, RawItem};
use vasari_error::{ProviderError, ProviderErrorKind, TimeoutError, VasariResult};
use vasari_interface::VasariDriver;

/// Reduces raw items into `{summary, themes, recommendations}`.
///
/// Stateless over the driver; determinism is not guaranteed, so the output
/// is parsed defensively and failures are attributed to the text provider.
pub struct InsightSynthesizer {
    driver: Arc<dyn VasariDriver>,
    timeout: Duration,
}

impl InsightSynthesizer {
    /// Create a synthesizer over the given driver.
    pub fn new(driver: Arc<dyn VasariDriver>, timeout: Duration) -> Self {
        Self { driver, timeout }
    }

    /// Synthesize an insight set from collected items.
    #[instrument(skip(self, items), fields(items = items.len(), topic = %topic))]
    pub async fn synthesize(
        &self,
        topic: &str,
        items: &[RawItem],
        depth: AnalysisDepth,
        model: Option<&str>,
    ) -> VasariResult<InsightSet> {
        let request = GenerateRequest {
            messages: vec![
                Message::system(
                    "You analyze research material for a content team. \
                     Respond with ONLY valid JSON of the shape \
                     {\"summary\": string, \"themes\": [string], \"recommendations\": [string]}.",
                ),
                Message::user(build_prompt(topic, items, depth)),
            ],
            max_tokens: Some(1024),
            temperature: Some(0.4),
            model: model.map(str::to_string),
        };

        let response = tokio::time::timeout(self.timeout, self.driver.generate(&request))
            .await
            .map_err(|_| TimeoutError::new("insight synthesis", self.timeout.as_secs()))??;

        let provider = self.driver.provider_name();
        let json = extract_json(&response.text).ok_or_else(|| {
            ProviderError::new(
                provider,
                ProviderErrorKind::InvalidResponse("no JSON in synthesis response".to_string()),
            )
        })?;

        let insights: InsightSet = serde_json::from_str(&json).map_err(|e| {
            ProviderError::new(
                provider,
                ProviderErrorKind::InvalidResponse(format!("malformed insight JSON: {e}")),
            )
        })?;

        tracing::info!(
            themes = insights.themes.len(),
            recommendations = insights.recommendations.len(),
            "Insight synthesis completed"
        );
        Ok(insights)
    }
}

fn build_prompt(topic: &str, items: &[RawItem], depth: AnalysisDepth) -> String {
    let mut prompt = format!(
        "Topic: {topic}\nAnalysis depth: {depth}\n\nResearch items ({}):\n",
        items.len()
    );
    for item in items {
        prompt.push_str(&format!("- [{}] {}", item.source, item.title));
        if let Some(score) = item.score {
            prompt.push_str(&format!(" (score {score})"));
        }
        if let Some(summary) = &item.summary {
            prompt.push_str(&format!(": {summary}"));
        }
        prompt.push('\n');
    }
    prompt.push_str(
        "\nDistill the material: one-paragraph summary, the recurring themes, \
         and concrete recommendations for a short-form content angle.",
    );
    prompt
}
