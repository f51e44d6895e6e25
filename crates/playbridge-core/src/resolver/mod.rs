//! Stream resolution: infer the container/protocol of a URI and describe the source

#[cfg(feature = "probe")]
pub mod probe;

use crate::{config::SessionConfig, Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Schemes the engine can load from
const SUPPORTED_SCHEMES: &[&str] = &["http", "https", "file", "content", "asset"];

/// Stream container/protocol types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StreamKind {
    /// Single file (mp4, mp3, webm, ...)
    Progressive,
    Dash,
    Hls,
    SmoothStreaming,
}

impl StreamKind {
    /// Adaptive formats need a manifest-driven chunk source
    pub fn is_adaptive(&self) -> bool {
        !matches!(self, StreamKind::Progressive)
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamKind::Progressive => write!(f, "progressive"),
            StreamKind::Dash => write!(f, "dash"),
            StreamKind::Hls => write!(f, "hls"),
            StreamKind::SmoothStreaming => write!(f, "smooth-streaming"),
        }
    }
}

/// Subtitle formats understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubtitleFormat {
    WebVtt,
    SubRip,
}

impl SubtitleFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            SubtitleFormat::WebVtt => "text/vtt",
            SubtitleFormat::SubRip => "application/x-subrip",
        }
    }
}

/// Network retry and timeout policy handed to the engine's data sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Minimum loadable retry count for manifests and chunks
    pub attempts: u32,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub allow_cross_protocol_redirects: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(10),
            allow_cross_protocol_redirects: true,
        }
    }
}

/// Chunk source strategy for the stream kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "strategy")]
pub enum Chunking {
    /// Whole-file extraction
    Extractor,
    /// DASH chunk source; live edge delay taken from the manifest
    DashChunks { prefer_manifest_live_delay: bool },
    /// HLS playlist-driven chunk loading
    HlsChunks,
    /// SmoothStreaming chunk source
    SsChunks,
}

impl Chunking {
    fn for_kind(kind: StreamKind) -> Self {
        match kind {
            StreamKind::Progressive => Chunking::Extractor,
            StreamKind::Dash => Chunking::DashChunks {
                prefer_manifest_live_delay: true,
            },
            StreamKind::Hls => Chunking::HlsChunks,
            StreamKind::SmoothStreaming => Chunking::SsChunks,
        }
    }
}

/// Side-loaded subtitle track, time-synchronized with the primary source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleTrack {
    pub uri: Url,
    pub format: SubtitleFormat,
    pub language: String,
}

impl SubtitleTrack {
    pub fn mime_hint(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// Resolved, engine-ready description of a stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamDescriptor {
    pub kind: StreamKind,
    pub uri: Url,
    pub retry_policy: RetryPolicy,
    pub chunking: Chunking,
    pub user_agent: String,
    pub subtitle: Option<SubtitleTrack>,
}

/// Resolve `uri` against the session configuration
pub fn resolve(uri: &str, config: &SessionConfig) -> Result<StreamDescriptor> {
    resolve_with_hint(uri, config, config.mime_type.as_deref())
}

/// Resolve `uri` with an explicit content-type hint in place of the configured one
pub fn resolve_with_hint(
    uri: &str,
    config: &SessionConfig,
    mime_type: Option<&str>,
) -> Result<StreamDescriptor> {
    let url = parse_uri(uri)?;
    let kind = infer_stream_kind(&url, mime_type);

    let subtitle = match config.subtitle_url.as_deref() {
        Some(raw) => {
            let sub_url = parse_uri(raw)?;
            let format = infer_subtitle_format(&sub_url);
            info!(subtitle = %sub_url, format = ?format, "Subtitle present");
            Some(SubtitleTrack {
                uri: sub_url,
                format,
                language: "en".to_string(),
            })
        }
        None => None,
    };

    debug!(uri = %url, kind = %kind, "Stream resolved");

    Ok(StreamDescriptor {
        kind,
        uri: url,
        retry_policy: RetryPolicy::default(),
        chunking: Chunking::for_kind(kind),
        user_agent: config.effective_user_agent(),
        subtitle,
    })
}

fn parse_uri(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::unsupported("empty URI"));
    }

    let url = Url::parse(trimmed).map_err(|e| Error::unsupported(format!("{}: {}", trimmed, e)))?;

    if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
        return Err(Error::unsupported(format!(
            "scheme '{}' is not loadable: {}",
            url.scheme(),
            trimmed
        )));
    }

    Ok(url)
}

/// Detect stream kind from a content-type hint or the URI path
pub fn infer_stream_kind(url: &Url, mime_type: Option<&str>) -> StreamKind {
    // Content type wins over the extension
    if let Some(kind) = mime_type.and_then(kind_from_mime) {
        return kind;
    }

    let path = url.path().to_lowercase();
    if path.ends_with(".mpd") {
        return StreamKind::Dash;
    }
    if path.ends_with(".m3u8") {
        return StreamKind::Hls;
    }
    if is_smooth_streaming_path(&path) {
        return StreamKind::SmoothStreaming;
    }

    StreamKind::Progressive
}

fn kind_from_mime(mime: &str) -> Option<StreamKind> {
    // Drop parameters such as "; charset=utf-8"
    let essence = mime.split(';').next().unwrap_or("").trim().to_lowercase();
    match essence.as_str() {
        "application/dash+xml" => Some(StreamKind::Dash),
        "application/x-mpegurl" | "application/vnd.apple.mpegurl" => Some(StreamKind::Hls),
        "application/vnd.ms-sstr+xml" => Some(StreamKind::SmoothStreaming),
        _ => None,
    }
}

/// Matches `.ism` / `.isml` optionally followed by `/manifest` or `/manifest(...)`
fn is_smooth_streaming_path(path: &str) -> bool {
    let base = path
        .rfind("/manifest")
        .filter(|idx| {
            let rest = &path[idx + "/manifest".len()..];
            rest.is_empty() || (rest.len() > 2 && rest.starts_with('(') && rest.ends_with(')'))
        })
        .map(|idx| &path[..idx])
        .unwrap_or(path);

    base.ends_with(".ism") || base.ends_with(".isml")
}

/// `.vtt` is WebVTT; anything else is assumed to be SubRip
pub fn infer_subtitle_format(url: &Url) -> SubtitleFormat {
    if url.path().to_lowercase().ends_with(".vtt") {
        SubtitleFormat::WebVtt
    } else {
        SubtitleFormat::SubRip
    }
}
