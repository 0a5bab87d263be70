//! Layered TOML configuration.
//!
//! Bundled defaults ship inside the binary (`include_str!`); a `vasari.toml`
//! in the working directory overrides individual values. Credentials are
//! never part of this file; they are read from the environment at adapter
//! construction.

use crate::EngineSettings;
use config::{Config, File, FileFormat};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use vasari_error::{ConfigError, VasariResult};
use vasari_publish::PublishConfig;
use vasari_research::ResearchConfig;
use vasari_video::VideoConfig;

const DEFAULT_CONFIG: &str = include_str!("../vasari.toml");

/// Engine tuning section.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    /// Bound on each text synthesis call
    pub synthesis_timeout_secs: u64,
}

/// Research tuning section.
#[derive(Debug, Clone, Deserialize)]
pub struct ResearchSection {
    /// Bound on each provider call
    pub call_timeout_secs: u64,
    /// Retry attempts per source for transient failures
    pub retry_attempts: usize,
    /// Initial backoff delay in milliseconds
    pub retry_base_delay_ms: u64,
    /// Feed endpoint per research source (source name to base URL)
    #[serde(default)]
    pub feeds: HashMap<String, String>,
}

/// Video tuning section.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoSection {
    /// Bound on each submit/status call
    pub call_timeout_secs: u64,
    /// Delay between render polls
    pub poll_interval_secs: u64,
    /// Wall-clock deadline for a render, from submission
    pub render_deadline_secs: u64,
    /// Render API base URL; video workflows fail without one
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Publishing tuning section.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishSection {
    /// Bound on each publish call
    pub call_timeout_secs: u64,
    /// Auto-schedule base delay in hours
    pub auto_schedule_base_hours: u64,
    /// Auto-schedule jitter in minutes
    pub auto_schedule_jitter_minutes: u64,
    /// Posting gateway per platform (platform name to base URL)
    #[serde(default)]
    pub gateways: HashMap<String, String>,
}

/// The full layered configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct VasariConfig {
    /// Engine tuning
    pub engine: EngineSection,
    /// Research tuning and feed endpoints
    pub research: ResearchSection,
    /// Video tuning and render endpoint
    pub video: VideoSection,
    /// Publishing tuning and gateway endpoints
    pub publish: PublishSection,
}

impl VasariConfig {
    /// Load bundled defaults merged under a local `vasari.toml` override.
    pub fn load() -> VasariResult<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::with_name("vasari").required(false))
            .build()
            .map_err(|e| ConfigError::new(format!("failed to load configuration: {e}")))?;

        settings
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("invalid configuration: {e}")).into())
    }

    /// Research layer tuning.
    pub fn research_config(&self) -> ResearchConfig {
        ResearchConfig {
            call_timeout: Duration::from_secs(self.research.call_timeout_secs),
            retry_attempts: self.research.retry_attempts,
            retry_base_delay: Duration::from_millis(self.research.retry_base_delay_ms),
        }
    }

    /// Video layer tuning.
    pub fn video_config(&self) -> VideoConfig {
        VideoConfig {
            call_timeout: Duration::from_secs(self.video.call_timeout_secs),
            poll_interval: Duration::from_secs(self.video.poll_interval_secs),
            render_deadline: Duration::from_secs(self.video.render_deadline_secs),
        }
    }

    /// Publishing layer tuning.
    pub fn publish_config(&self) -> PublishConfig {
        PublishConfig {
            call_timeout: Duration::from_secs(self.publish.call_timeout_secs),
            auto_schedule_base: Duration::from_secs(self.publish.auto_schedule_base_hours * 3600),
            auto_schedule_jitter: Duration::from_secs(
                self.publish.auto_schedule_jitter_minutes * 60,
            ),
        }
    }

    /// Engine tuning.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            synthesis_timeout: Duration::from_secs(self.engine.synthesis_timeout_secs),
            video: self.video_config(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_defaults_deserialize() {
        let settings = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .unwrap();
        let config: VasariConfig = settings.try_deserialize().unwrap();

        assert_eq!(config.engine.synthesis_timeout_secs, 60);
        assert_eq!(config.video.render_deadline_secs, 900);
        assert!(config.research.feeds.is_empty());
    }
}
