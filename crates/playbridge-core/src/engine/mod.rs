//! Playback engine seam
//!
//! The engine (decode, render, adaptive selection, buffering) lives outside
//! this crate. It is driven through [`MediaEngine`] and reports back through
//! an [`EngineListener`], which queues callbacks for the session controller
//! instead of calling into it.

pub mod adapter;
pub mod simulated;

pub use adapter::PlaybackAdapter;
pub use simulated::{SimulatedEngine, SimulatedEngineFactory, SimulatedEngineProbe};

use crate::session::{Signal, SignalSender};
use crate::source::{MediaSource, TrackOrigin};
use crate::types::Phase;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Identifies one engine instance within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EngineId(pub u64);

impl std::fmt::Display for EngineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "engine-{}", self.0)
    }
}

/// Category of an engine-reported failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EngineErrorKind {
    /// Loading or parsing media failed
    Source,
    /// A decoder or renderer failed
    Renderer,
    Unexpected,
}

impl EngineErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            EngineErrorKind::Source => "SOURCE",
            EngineErrorKind::Renderer => "RENDERER",
            EngineErrorKind::Unexpected => "UNEXPECTED",
        }
    }
}

/// Failure reported by the engine during playback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineError {
    pub kind: EngineErrorKind,
    pub origin: TrackOrigin,
    pub message: String,
}

impl EngineError {
    pub fn new(kind: EngineErrorKind, origin: TrackOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error on {:?} track: {}", self.kind.code(), self.origin, self.message)
    }
}

/// Raw engine callbacks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "callback")]
pub enum EngineCallback {
    PlaybackParametersChanged { speed: f32, pitch: f32 },
    Error(EngineError),
    LoadingChanged { is_loading: bool },
    StateChanged { play_when_ready: bool, phase: Phase },
    PositionDiscontinuity,
    TimelineChanged { duration_ms: Option<u64>, is_dynamic: bool },
    TracksChanged { track_count: usize },
}

/// Handed to an engine at creation; queues its callbacks for the controller
#[derive(Debug, Clone)]
pub struct EngineListener {
    id: EngineId,
    signals: SignalSender,
}

impl EngineListener {
    pub(crate) fn new(id: EngineId, signals: SignalSender) -> Self {
        Self { id, signals }
    }

    pub fn engine_id(&self) -> EngineId {
        self.id
    }

    /// Queue a callback; dropped silently once the session is gone
    pub fn notify(&self, callback: EngineCallback) {
        self.signals.send(Signal::Engine {
            engine: self.id,
            callback,
        });
    }
}

/// A playback engine instance
pub trait MediaEngine: Send {
    /// Load a source; an error means the source could not be turned into a playable pipeline
    fn prepare(&mut self, source: &MediaSource) -> Result<()>;

    fn set_play_when_ready(&mut self, play_when_ready: bool);

    fn seek_to(&mut self, position_ms: u64);

    fn position_ms(&self) -> u64;

    /// `None` while unknown
    fn duration_ms(&self) -> Option<u64>;

    /// Stop and free native resources
    fn release(&mut self);
}

/// Creates engine instances for a session
pub trait EngineFactory: Send {
    fn create(&mut self, listener: EngineListener) -> Result<Box<dyn MediaEngine>>;
}
