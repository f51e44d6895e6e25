//! Client events and the channel that carries them to the host

use crate::types::{KeyAction, Phase, PlaybackState, SessionId, TouchAction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::warn;

/// Event delivered to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    /// Engine prepared and playback requested
    Start,

    /// Session ended by close or dismissal
    Stop,

    Loading {
        #[serde(rename = "isLoading")]
        is_loading: bool,
    },

    #[serde(rename = "state")]
    StateChanged { phase: Phase },

    PositionDiscontinuity,

    /// Carries the target the client asked for, before clamping
    Seek {
        #[serde(rename = "requestedMs")]
        requested_ms: i64,
    },

    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
        message: String,
    },

    #[serde(rename = "key")]
    KeyPress { code: String, action: KeyAction },

    Touch { action: TouchAction },
}

impl Event {
    pub fn is_error(&self) -> bool {
        matches!(self, Event::Error { .. })
    }

    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            Event::Start => "start",
            Event::Stop => "stop",
            Event::Loading { .. } => "loading",
            Event::StateChanged { .. } => "state",
            Event::PositionDiscontinuity => "positionDiscontinuity",
            Event::Seek { .. } => "seek",
            Event::Error { .. } => "error",
            Event::KeyPress { .. } => "key",
            Event::Touch { .. } => "touch",
        }
    }
}

/// Event with session metadata, as serialized onto the client channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub session_id: SessionId,
    /// Monotonic per session, starting at 0
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
    /// Engine state at emission; absent when no engine exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<PlaybackState>,
}

impl EventRecord {
    /// Errors are delivered with an error status
    pub fn is_error(&self) -> bool {
        self.event.is_error()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Transport back to the hosting application
pub trait ClientChannel: Send + Sync {
    fn send(&self, record: EventRecord);
}

impl ClientChannel for mpsc::UnboundedSender<EventRecord> {
    fn send(&self, record: EventRecord) {
        if mpsc::UnboundedSender::send(self, record).is_err() {
            warn!("Client channel closed, event dropped");
        }
    }
}

/// Keeps every record in memory
#[derive(Debug, Clone, Default)]
pub struct RecordingChannel {
    records: Arc<Mutex<Vec<EventRecord>>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn events(&self) -> Vec<Event> {
        self.records().into_iter().map(|r| r.event).collect()
    }

    /// Number of recorded events with the given wire name
    pub fn count(&self, name: &str) -> usize {
        self.records()
            .iter()
            .filter(|r| r.event.name() == name)
            .count()
    }

    pub fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl ClientChannel for RecordingChannel {
    fn send(&self, record: EventRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }
}
