//! Session configuration parsed from the host's options object

use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// What happens when the subtitle track fails to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubtitlePolicy {
    /// Log the failure and keep playing the primary source
    #[default]
    Degrade,
    /// Report the failure to the client as an error event
    Fatal,
}

/// Options for the client-facing playback control surface
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControllerOptions {
    pub stream_image: Option<String>,
    pub stream_title: Option<String>,
    pub stream_description: Option<String>,
    pub hide_progress: bool,
    pub hide_position: bool,
    pub hide_duration: bool,
    /// Keys this crate does not interpret, passed through to the surface
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Immutable parameters for one playback session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Stream location
    #[serde(rename = "url")]
    pub uri: String,
    /// Skip the presentation surface entirely
    #[serde(default)]
    pub audio_only: bool,
    /// Seek to this offset before the first frame
    #[serde(
        default,
        deserialize_with = "deserialize_offset",
        serialize_with = "serialize_offset"
    )]
    pub play_offset: Option<Duration>,
    #[serde(default)]
    pub subtitle_url: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Content-type hint for stream inference
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub subtitle_policy: SubtitlePolicy,
    #[serde(default, rename = "controller")]
    pub controller_options: ControllerOptions,
}

impl SessionConfig {
    /// Minimal configuration for a stream URI
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            audio_only: false,
            play_offset: None,
            subtitle_url: None,
            user_agent: None,
            mime_type: None,
            subtitle_policy: SubtitlePolicy::default(),
            controller_options: ControllerOptions::default(),
        }
    }

    pub fn audio_only(mut self, audio_only: bool) -> Self {
        self.audio_only = audio_only;
        self
    }

    pub fn with_play_offset(mut self, offset: Duration) -> Self {
        self.play_offset = Some(offset);
        self
    }

    pub fn with_subtitle(mut self, url: impl Into<String>) -> Self {
        self.subtitle_url = Some(url.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_subtitle_policy(mut self, policy: SubtitlePolicy) -> Self {
        self.subtitle_policy = policy;
        self
    }

    pub fn with_controller(mut self, options: ControllerOptions) -> Self {
        self.controller_options = options;
        self
    }

    /// Parse and validate the host's JSON options object
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations no stream could be resolved from
    pub fn validate(&self) -> Result<()> {
        if self.uri.trim().is_empty() {
            return Err(Error::InvalidConfig("url must not be empty".to_string()));
        }
        if matches!(self.subtitle_url.as_deref(), Some(s) if s.trim().is_empty()) {
            return Err(Error::InvalidConfig(
                "subtitleUrl must not be empty when present".to_string(),
            ));
        }
        Ok(())
    }

    /// User agent sent with every request, falling back to the library default
    pub fn effective_user_agent(&self) -> String {
        match self.user_agent.as_deref() {
            Some(ua) if !ua.trim().is_empty() => {
                format!("{} playbridge/{}", ua.trim(), crate::VERSION)
            }
            _ => format!("playbridge/{}", crate::VERSION),
        }
    }
}

/// Offsets arrive as milliseconds, possibly fractional; negative or NaN means "start from the beginning"
fn deserialize_offset<'de, D>(deserializer: D) -> std::result::Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<f64> = Option::deserialize(deserializer)?;
    Ok(raw
        .filter(|ms| *ms >= 0.0)
        .map(|ms| Duration::from_millis(ms.trunc() as u64)))
}

fn serialize_offset<S>(offset: &Option<Duration>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match offset {
        Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
        None => serializer.serialize_none(),
    }
}
