use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::Arc;
use std::time::Duration;
use vasari_core::{
    AnalysisDepth, ContentType, GenerateRequest, GenerateResponse, Platform, RawItem,
    ResearchSource,
};
use vasari_error::VasariResult;
use vasari_interface::VasariDriver;
use vasari_synthesis::{InsightSynthesizer, ScriptParams, ScriptWriter, caption_ceiling};

/// Driver that replays a scripted sequence of responses.
struct ScriptedDriver {
    responses: Mutex<Vec<String>>,
    calls: Mutex<usize>,
}

impl ScriptedDriver {
    fn new(responses: Vec<&str>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().rev().map(String::from).collect()),
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl VasariDriver for ScriptedDriver {
    async fn generate(&self, _req: &GenerateRequest) -> VasariResult<GenerateResponse> {
        *self.calls.lock().unwrap() += 1;
        let text = self
            .responses
            .lock()
            .unwrap()
            .pop()
            .expect("scripted driver ran out of responses");
        Ok(GenerateResponse {
            text,
            model: "scripted".to_string(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

fn items() -> Vec<RawItem> {
    vec![RawItem {
        source: ResearchSource::TechNews,
        title: "Agents are eating the toolchain".to_string(),
        url: None,
        author: None,
        score: Some(312),
        summary: Some("Discussion of agentic coding workflows".to_string()),
        published_at: None,
    }]
}

fn params(platforms: Vec<Platform>) -> ScriptParams {
    ScriptParams {
        content_type: ContentType::SocialPost,
        platforms,
        tone: "punchy".to_string(),
        audience: "developers".to_string(),
        target_duration_secs: None,
        model: None,
    }
}

#[tokio::test]
async fn insights_parse_from_fenced_json() {
    let driver = ScriptedDriver::new(vec![
        "Here is the analysis:\n```json\n{\"summary\": \"agents are the story\", \
         \"themes\": [\"automation\"], \"recommendations\": [\"lead with a demo\"]}\n```",
    ]);
    let synthesizer = InsightSynthesizer::new(driver.clone(), Duration::from_secs(5));

    let insights = synthesizer
        .synthesize("AI automation", &items(), AnalysisDepth::Standard, None)
        .await
        .unwrap();

    assert_eq!(insights.summary, "agents are the story");
    assert_eq!(insights.themes, vec!["automation"]);
    assert_eq!(driver.calls(), 1);
}

#[tokio::test]
async fn prose_without_json_is_an_invalid_response() {
    let driver = ScriptedDriver::new(vec!["I could not find anything useful."]);
    let synthesizer = InsightSynthesizer::new(driver, Duration::from_secs(5));

    let err = synthesizer
        .synthesize("AI automation", &items(), AnalysisDepth::Quick, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err.kind(),
        vasari_error::VasariErrorKind::Provider(_)
    ));
}

#[tokio::test]
async fn ceiling_violation_triggers_exactly_one_constrained_pass() {
    let long_body = "x".repeat(400);
    let first = format!("{{\"title\": \"t\", \"content\": \"{long_body}\"}}");
    let second = "{\"title\": \"t\", \"content\": \"tight version\"}";
    let driver = ScriptedDriver::new(vec![&first, second]);
    let writer = ScriptWriter::new(driver.clone(), Duration::from_secs(5));

    // X's 280-character ceiling is the binding constraint.
    let draft = writer
        .write("AI automation", None, &params(vec![Platform::X]))
        .await
        .unwrap();

    assert_eq!(draft.content, "tight version");
    assert_eq!(driver.calls(), 2);
}

#[tokio::test]
async fn second_violation_fails_instead_of_truncating() {
    let long_body = "x".repeat(400);
    let payload = format!("{{\"title\": \"t\", \"content\": \"{long_body}\"}}");
    let driver = ScriptedDriver::new(vec![&payload, &payload]);
    let writer = ScriptWriter::new(driver.clone(), Duration::from_secs(5));

    let err = writer
        .write("AI automation", None, &params(vec![Platform::X]))
        .await
        .unwrap_err();

    assert!(format!("{err}").contains("ceiling"));
    assert_eq!(driver.calls(), 2);
}

#[tokio::test]
async fn within_ceiling_draft_passes_on_the_first_try() {
    let driver =
        ScriptedDriver::new(vec!["{\"title\": \"t\", \"content\": \"short and sweet\"}"]);
    let writer = ScriptWriter::new(driver.clone(), Duration::from_secs(5));

    let draft = writer
        .write(
            "AI automation",
            None,
            &params(vec![Platform::Tiktok, Platform::Youtube]),
        )
        .await
        .unwrap();

    assert_eq!(draft.content, "short and sweet");
    assert_eq!(driver.calls(), 1);
}

#[test]
fn ceiling_is_the_strictest_target() {
    assert_eq!(caption_ceiling(&[Platform::Tiktok, Platform::X]), 280);
    assert_eq!(caption_ceiling(&[Platform::Tiktok, Platform::Youtube]), 2200);
}
