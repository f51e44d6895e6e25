//! Playback engine adapter - owns the session's single engine instance

use super::{EngineCallback, EngineId, MediaEngine};
use crate::event::Event;
use crate::resolver::StreamDescriptor;
use crate::source::MediaSource;
use crate::types::PlaybackState;
use crate::Result;
use std::time::Duration;
use tracing::{debug, info};

/// Wraps at most one engine and the state its callbacks have reported
#[derive(Default)]
pub struct PlaybackAdapter {
    engine: Option<Box<dyn MediaEngine>>,
    engine_id: Option<EngineId>,
    /// Source currently prepared on the engine
    source: Option<MediaSource>,
    state: PlaybackState,
}

impl PlaybackAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a new engine, releasing any previous one
    pub fn install(&mut self, id: EngineId, engine: Box<dyn MediaEngine>) {
        self.release();
        info!(engine = %id, "Engine installed");
        self.engine = Some(engine);
        self.engine_id = Some(id);
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    pub fn engine_id(&self) -> Option<EngineId> {
        self.engine_id
    }

    pub fn source(&self) -> Option<&MediaSource> {
        self.source.as_ref()
    }

    /// Build the engine source, apply the start offset, and start playback when ready
    pub fn prepare(&mut self, descriptor: &StreamDescriptor, start_offset: Option<Duration>) -> Result<()> {
        let Some(engine) = self.engine.as_mut() else {
            return Err(crate::Error::Construction("no engine instance".to_string()));
        };

        let source = MediaSource::build(descriptor);

        if let Some(offset) = start_offset {
            debug!(offset_ms = offset.as_millis() as u64, "Seeking before first frame");
            engine.seek_to(offset.as_millis() as u64);
        }

        engine.prepare(&source)?;
        engine.set_play_when_ready(true);

        info!(uri = %descriptor.uri, kind = %descriptor.kind, "Engine prepared");
        self.source = Some(source);
        Ok(())
    }

    pub fn play(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.set_play_when_ready(true);
        }
    }

    pub fn pause(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.set_play_when_ready(false);
        }
    }

    /// Seek to a clamped position; the returned event carries the requested target
    pub fn seek_to(&mut self, target_ms: i64) -> Option<Event> {
        let duration_ms = self.duration_ms();
        let engine = self.engine.as_mut()?;
        let clamped = clamp_seek(target_ms, duration_ms);
        debug!(requested = target_ms, clamped, "Seeking");
        engine.seek_to(clamped);
        Some(Event::Seek { requested_ms: target_ms })
    }

    /// Stop the engine and drop it; safe to call repeatedly
    pub fn release(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.release();
            info!(engine = ?self.engine_id, "Engine released");
        }
        self.engine_id = None;
        self.source = None;
        self.state = PlaybackState::default();
    }

    /// Record what a callback says about the engine's state
    pub fn observe(&mut self, callback: &EngineCallback) {
        match callback {
            EngineCallback::StateChanged { play_when_ready, phase } => {
                self.state.phase = *phase;
                self.state.play_when_ready = *play_when_ready;
            }
            EngineCallback::TimelineChanged { duration_ms, .. } => {
                self.state.duration_ms = *duration_ms;
            }
            _ => {}
        }
    }

    /// Engine-reported duration, else the last one seen in a timeline callback
    fn duration_ms(&self) -> Option<u64> {
        self.engine
            .as_ref()
            .and_then(|engine| engine.duration_ms())
            .or(self.state.duration_ms)
    }

    /// Current state with live position and duration from the engine
    pub fn current_state(&self) -> PlaybackState {
        match self.engine.as_ref() {
            Some(engine) => PlaybackState {
                position_ms: engine.position_ms(),
                duration_ms: self.duration_ms(),
                ..self.state
            },
            None => self.state,
        }
    }
}

/// Clamp a seek target into `[0, duration]`; a zero duration always clamps to 0
pub fn clamp_seek(target_ms: i64, duration_ms: Option<u64>) -> u64 {
    let floor = target_ms.max(0) as u64;
    match duration_ms {
        Some(0) => 0,
        Some(duration) => floor.min(duration),
        None => floor,
    }
}
