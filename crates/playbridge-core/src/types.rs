//! Core types for Playbridge

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Engine playback phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// No source prepared, or engine stopped
    #[default]
    Idle,
    /// Not enough media buffered to render
    Buffering,
    /// Able to render immediately from the current position
    Ready,
    /// Reached the end of the media
    Ended,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Buffering => write!(f, "buffering"),
            Phase::Ready => write!(f, "ready"),
            Phase::Ended => write!(f, "ended"),
        }
    }
}

/// Snapshot of the engine's playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub phase: Phase,
    pub play_when_ready: bool,
    pub position_ms: u64,
    /// `None` while the engine does not know the duration (live or unprepared)
    pub duration_ms: Option<u64>,
}

impl PlaybackState {
    /// True when the engine is rendering
    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Ready && self.play_when_ready
    }
}

/// Key event action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyAction {
    Down,
    Up,
    Multiple,
}

/// Touch event action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TouchAction {
    Down,
    Up,
    Move,
    Cancel,
}
