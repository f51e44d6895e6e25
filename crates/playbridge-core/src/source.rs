//! Engine-ready media sources built from a resolved stream descriptor

use crate::resolver::{Chunking, RetryPolicy, StreamDescriptor, StreamKind, SubtitleTrack};
use serde::{Deserialize, Serialize};
use url::Url;

/// HTTP data source settings shared by every loader of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceSpec {
    pub user_agent: String,
    pub retry_policy: RetryPolicy,
}

/// Which part of a merged source a load belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackOrigin {
    Primary,
    Subtitle,
}

/// A source the engine can prepare directly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "source")]
pub enum MediaSource {
    /// A single primary stream
    Stream {
        kind: StreamKind,
        uri: Url,
        chunking: Chunking,
        data_source: DataSourceSpec,
    },
    /// One text sample spanning the whole primary timeline
    SingleSample {
        uri: Url,
        mime_type: String,
        language: String,
        data_source: DataSourceSpec,
    },
    /// Primary plus side-loaded sources played in sync; the first entry owns the timeline
    Merging { sources: Vec<MediaSource> },
}

impl MediaSource {
    /// Build the engine source tree for a descriptor
    pub fn build(descriptor: &StreamDescriptor) -> Self {
        let data_source = DataSourceSpec {
            user_agent: descriptor.user_agent.clone(),
            retry_policy: descriptor.retry_policy,
        };

        let primary = MediaSource::Stream {
            kind: descriptor.kind,
            uri: descriptor.uri.clone(),
            chunking: descriptor.chunking,
            data_source: data_source.clone(),
        };

        match &descriptor.subtitle {
            Some(track) => MediaSource::Merging {
                sources: vec![primary, Self::subtitle_source(track, data_source)],
            },
            None => primary,
        }
    }

    fn subtitle_source(track: &SubtitleTrack, data_source: DataSourceSpec) -> Self {
        MediaSource::SingleSample {
            uri: track.uri.clone(),
            mime_type: track.mime_hint().to_string(),
            language: track.language.clone(),
            data_source,
        }
    }

    /// The source whose duration and errors define the session
    pub fn primary(&self) -> &MediaSource {
        match self {
            MediaSource::Merging { sources } => sources.first().map(|s| s.primary()).unwrap_or(self),
            other => other,
        }
    }

    /// Locate the origin of a URI inside this source tree
    pub fn origin_of(&self, uri: &Url) -> Option<TrackOrigin> {
        match self {
            MediaSource::Stream { uri: u, .. } if u == uri => Some(TrackOrigin::Primary),
            MediaSource::SingleSample { uri: u, .. } if u == uri => Some(TrackOrigin::Subtitle),
            MediaSource::Merging { sources } => sources.iter().find_map(|s| s.origin_of(uri)),
            _ => None,
        }
    }

    /// All URIs the engine will load, primary first
    pub fn uris(&self) -> Vec<&Url> {
        match self {
            MediaSource::Stream { uri, .. } | MediaSource::SingleSample { uri, .. } => vec![uri],
            MediaSource::Merging { sources } => sources.iter().flat_map(|s| s.uris()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::resolver::resolve;

    #[test]
    fn test_build_single_source() {
        let config = SessionConfig::new("https://x/stream.mpd");
        let descriptor = resolve(&config.uri, &config).unwrap();
        let source = MediaSource::build(&descriptor);

        match &source {
            MediaSource::Stream { kind, chunking, data_source, .. } => {
                assert_eq!(*kind, StreamKind::Dash);
                assert_eq!(*chunking, Chunking::DashChunks { prefer_manifest_live_delay: true });
                assert_eq!(data_source.retry_policy.attempts, 10);
            }
            other => panic!("unexpected source {:?}", other),
        }
        assert_eq!(source.primary(), &source);
    }

    #[test]
    fn test_build_merging_source_keeps_primary_first() {
        let config = SessionConfig::new("https://x/video.mp4").with_subtitle("https://x/subs.srt");
        let descriptor = resolve(&config.uri, &config).unwrap();
        let source = MediaSource::build(&descriptor);

        let uris: Vec<String> = source.uris().iter().map(|u| u.to_string()).collect();
        assert_eq!(uris, vec!["https://x/video.mp4", "https://x/subs.srt"]);

        assert!(matches!(source.primary(), MediaSource::Stream { .. }));

        let sub = Url::parse("https://x/subs.srt").unwrap();
        assert_eq!(source.origin_of(&sub), Some(TrackOrigin::Subtitle));
        assert_eq!(source.origin_of(&descriptor.uri), Some(TrackOrigin::Primary));

        if let MediaSource::Merging { sources } = &source {
            assert!(matches!(
                &sources[1],
                MediaSource::SingleSample { mime_type, .. } if mime_type == "application/x-subrip"
            ));
        }
    }
}
