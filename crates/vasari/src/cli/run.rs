//! Command handlers and engine wiring.

use crate::cli::Commands;
use vasari::{VasariConfig, WorkflowEngine};
use chrono::{DateTime, Utc};
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;
use vasari_core::{
    ApprovalDecision, AspectRatio, AvatarSelection, ContentType, Platform, ResearchSource,
    WorkflowConfigBuilder, WorkflowExecution, WorkflowFilter, WorkflowStatus,
};
use vasari_error::{ConfigError, StaleStateError, StaleStateErrorKind, ValidationError, VasariResult};
use vasari_models::{ChatClient, ChatEndpoint};
use vasari_publish::{HttpPublisher, PublishDispatcher, PublisherEndpoint, resolve_timing};
use vasari_research::{FeedEndpoint, JsonFeedProvider, ResearchAggregator};
use vasari_store::{InMemoryWorkflowStore, WorkflowStore};
use vasari_video::{RenderClient, RenderEndpoint};

fn required_env(name: &str) -> VasariResult<String> {
    std::env::var(name)
        .map_err(|_| ConfigError::new(format!("{name} environment variable not set")).into())
}

#[cfg(feature = "postgres")]
fn build_store() -> VasariResult<Arc<dyn WorkflowStore>> {
    use vasari_store::{PostgresWorkflowStore, establish_pool};

    match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let store = PostgresWorkflowStore::new(establish_pool(&url)?);
            store.run_migrations()?;
            Ok(Arc::new(store))
        }
        Err(_) => {
            warn!("DATABASE_URL not set; using the in-memory store (state is lost on exit)");
            Ok(Arc::new(InMemoryWorkflowStore::new()))
        }
    }
}

#[cfg(not(feature = "postgres"))]
fn build_store() -> VasariResult<Arc<dyn WorkflowStore>> {
    warn!("built without postgres support; using the in-memory store");
    Ok(Arc::new(InMemoryWorkflowStore::new()))
}

/// Wire the engine from configuration and environment credentials.
pub async fn build_engine(config: &VasariConfig) -> VasariResult<WorkflowEngine> {
    let store = build_store()?;

    let driver = Arc::new(ChatClient::new(ChatEndpoint {
        base_url: std::env::var("VASARI_TEXT_API_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
        api_key: required_env("VASARI_TEXT_API_KEY")?,
        model: std::env::var("VASARI_TEXT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
    }));

    let mut aggregator = ResearchAggregator::new(config.research_config());
    let feed_key = std::env::var("VASARI_FEED_API_KEY").ok();
    for (source, base_url) in &config.research.feeds {
        let source = ResearchSource::from_str(source)
            .map_err(|_| ConfigError::new(format!("unknown research source '{source}'")))?;
        aggregator = aggregator.with_provider(Arc::new(JsonFeedProvider::new(
            source,
            FeedEndpoint {
                base_url: base_url.clone(),
                api_key: feed_key.clone(),
            },
        )));
    }

    let mut dispatcher = PublishDispatcher::new(config.publish_config());
    let publish_key = std::env::var("VASARI_PUBLISH_API_KEY").unwrap_or_default();
    for (platform, base_url) in &config.publish.gateways {
        let platform = Platform::from_str(platform)
            .map_err(|_| ConfigError::new(format!("unknown platform '{platform}'")))?;
        dispatcher = dispatcher.with_publisher(Arc::new(HttpPublisher::new(
            platform,
            PublisherEndpoint {
                base_url: base_url.clone(),
                api_key: publish_key.clone(),
            },
        )));
    }

    let mut engine = WorkflowEngine::new(
        store,
        driver,
        aggregator,
        dispatcher,
        config.engine_settings(),
    );
    if let Some(base_url) = &config.video.base_url {
        engine = engine.with_video_provider(Arc::new(RenderClient::new(RenderEndpoint {
            base_url: base_url.clone(),
            api_key: required_env("VASARI_RENDER_API_KEY")?,
        })));
    }
    Ok(engine)
}

/// Execute one CLI command against the engine.
pub async fn handle_command(engine: &WorkflowEngine, command: Commands) -> VasariResult<()> {
    match command {
        Commands::Start {
            topic,
            platforms,
            sources,
            video,
            avatar,
            voice,
            tone,
            audience,
            depth,
            max_items,
            publish_at,
            auto_schedule,
            no_approval,
            owner,
            name,
        } => {
            let publish_at = publish_at
                .map(|raw| {
                    DateTime::parse_from_rfc3339(&raw)
                        .map(|dt| dt.with_timezone(&Utc))
                        .map_err(|e| ValidationError::new(format!("invalid --publish-at: {e}")))
                })
                .transpose()?;
            let timing = resolve_timing(publish_at, auto_schedule)?;

            let avatar = match (video, avatar, voice) {
                (false, _, _) => None,
                (true, Some(avatar_id), Some(voice_id)) => Some(AvatarSelection {
                    avatar_id,
                    voice_id,
                    aspect_ratio: AspectRatio::Portrait,
                }),
                (true, _, _) => {
                    return Err(ValidationError::new(
                        "--video requires --avatar and --voice",
                    )
                    .into());
                }
            };

            let mut builder = WorkflowConfigBuilder::default();
            builder
                .topic(topic.clone())
                .platforms(platforms)
                .sources(sources)
                .video_requested(video)
                .content_type(if video {
                    ContentType::VideoScript
                } else {
                    ContentType::SocialPost
                })
                .timing(timing)
                .require_approval(!no_approval)
                .avatar(avatar);
            if let Some(tone) = tone {
                builder.tone(tone);
            }
            if let Some(audience) = audience {
                builder.audience(audience);
            }
            if let Some(depth) = depth {
                builder.depth(depth);
            }
            if let Some(max_items) = max_items {
                builder.max_items(max_items);
            }
            let config = builder
                .build()
                .map_err(|e| ValidationError::new(e.to_string()))?;

            let name = name.unwrap_or_else(|| slugify(&topic));
            let workflow = engine.start(&owner, &name, config).await?;
            println!("workflow {} accepted", workflow.id);

            let status = engine.run_to_approval(workflow.id).await?;
            print_workflow(&engine.get(workflow.id).await?);
            if status == WorkflowStatus::AwaitingApproval {
                if let Some(approval) = engine.pending_approval(workflow.id).await? {
                    println!(
                        "awaiting approval: run `vasari approve {}` or `vasari reject {}`",
                        workflow.id, workflow.id
                    );
                    println!("--- content under review ---");
                    println!("{}", approval.title);
                    println!("{}", approval.content);
                    if let Some(url) = &approval.video_url {
                        println!("video: {url}");
                    }
                }
            }
            Ok(())
        }

        Commands::Status { id } => {
            print_workflow(&engine.get(id).await?);
            Ok(())
        }

        Commands::List { status, limit } => {
            let filter = WorkflowFilter {
                status,
                owner: None,
                limit,
            };
            for workflow in engine.list(&filter).await? {
                println!(
                    "{}  {:<18}  {:>3}%  {}",
                    workflow.id,
                    workflow.status.to_string(),
                    workflow.progress(),
                    workflow.name
                );
            }
            Ok(())
        }

        Commands::Approve {
            id,
            approver,
            feedback,
        } => {
            let approval = require_pending_approval(engine, id).await?;
            engine
                .resolve_approval(approval.id, ApprovalDecision::Approve, approver, feedback)
                .await?;
            let workflow = engine.resume_after_approval(id).await?;
            print_workflow(&workflow);
            Ok(())
        }

        Commands::Reject {
            id,
            approver,
            feedback,
        } => {
            let approval = require_pending_approval(engine, id).await?;
            let workflow = engine
                .resolve_approval(approval.id, ApprovalDecision::Reject, approver, feedback)
                .await?;
            print_workflow(&workflow);
            Ok(())
        }

        Commands::Cancel { id } => {
            let workflow = engine.cancel(id).await?;
            print_workflow(&workflow);
            Ok(())
        }

        Commands::Delete { id } => {
            engine.delete(id).await?;
            println!("workflow {id} deleted");
            Ok(())
        }
    }
}

async fn require_pending_approval(
    engine: &WorkflowEngine,
    workflow_id: Uuid,
) -> VasariResult<vasari_core::WorkflowApproval> {
    engine.pending_approval(workflow_id).await?.ok_or_else(|| {
        StaleStateError::new(StaleStateErrorKind::AlreadyResolved {
            approval_id: format!("for workflow {workflow_id}"),
            resolution: "no pending approval".to_string(),
        })
        .into()
    })
}

fn print_workflow(workflow: &WorkflowExecution) {
    println!(
        "{}  {}  {}%",
        workflow.id,
        workflow.status,
        workflow.progress()
    );
    if let Some(error) = &workflow.error_message {
        println!("error: {error}");
    }
    if let Some(results) = &workflow.results {
        println!("title: {}", results.title);
        if let Some(url) = &results.video_url {
            println!("video: {url}");
        }
        for publication in &results.publications {
            match (&publication.status, &publication.platform_post_id) {
                (vasari_core::PublicationStatus::Published, Some(post_id)) => {
                    println!("{}: published as {post_id}", publication.platform)
                }
                _ => println!(
                    "{}: {} ({})",
                    publication.platform,
                    publication.status,
                    publication.error_message.as_deref().unwrap_or("no detail")
                ),
            }
        }
    }
}

fn slugify(topic: &str) -> String {
    topic
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
