//! Headless simulated engine
//!
//! Deterministic stand-in for a platform media engine. It records every
//! command it receives and emits the callbacks a real engine would, so the
//! controller can be exercised without a media stack. The paired
//! [`SimulatedEngineProbe`] inspects the recorded calls and scripts callbacks
//! such as readiness, errors, or end of stream.

use super::{EngineCallback, EngineError, EngineErrorKind, EngineFactory, EngineListener, MediaEngine};
use crate::source::{MediaSource, TrackOrigin};
use crate::types::Phase;
use crate::{Error, Result};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Debug, Default)]
struct SimState {
    duration_ms: Option<u64>,
    position_ms: u64,
    play_when_ready: bool,
    phase: Phase,
    seeks: Vec<u64>,
    prepared: Vec<MediaSource>,
    release_count: usize,
    fail_next_prepare: Option<String>,
}

type Shared = Arc<Mutex<SimState>>;

fn lock(shared: &Shared) -> MutexGuard<'_, SimState> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Simulated engine instance
pub struct SimulatedEngine {
    shared: Shared,
    listener: Option<EngineListener>,
}

impl SimulatedEngine {
    /// Engine reporting callbacks through `listener`
    pub fn new(listener: EngineListener, duration_ms: Option<u64>) -> (Self, SimulatedEngineProbe) {
        Self::build(Some(listener), duration_ms)
    }

    /// Engine with nowhere to send callbacks
    pub fn detached(duration_ms: Option<u64>) -> (Self, SimulatedEngineProbe) {
        Self::build(None, duration_ms)
    }

    fn build(listener: Option<EngineListener>, duration_ms: Option<u64>) -> (Self, SimulatedEngineProbe) {
        let shared: Shared = Arc::new(Mutex::new(SimState {
            duration_ms,
            ..Default::default()
        }));
        let probe = SimulatedEngineProbe {
            shared: shared.clone(),
            listener: listener.clone(),
        };
        (Self { shared, listener }, probe)
    }

    fn notify(&self, callback: EngineCallback) {
        if let Some(listener) = &self.listener {
            listener.notify(callback);
        }
    }
}

impl MediaEngine for SimulatedEngine {
    fn prepare(&mut self, source: &MediaSource) -> Result<()> {
        let duration_ms = {
            let mut state = lock(&self.shared);
            if let Some(reason) = state.fail_next_prepare.take() {
                return Err(Error::Construction(reason));
            }
            state.prepared.push(source.clone());
            state.phase = Phase::Buffering;
            state.duration_ms
        };

        debug!(uris = source.uris().len(), "Simulated engine prepared");

        let play_when_ready = lock(&self.shared).play_when_ready;
        self.notify(EngineCallback::LoadingChanged { is_loading: true });
        self.notify(EngineCallback::TimelineChanged {
            duration_ms,
            is_dynamic: duration_ms.is_none(),
        });
        self.notify(EngineCallback::StateChanged {
            play_when_ready,
            phase: Phase::Buffering,
        });
        Ok(())
    }

    fn set_play_when_ready(&mut self, play_when_ready: bool) {
        let (changed, phase) = {
            let mut state = lock(&self.shared);
            let changed = state.play_when_ready != play_when_ready;
            state.play_when_ready = play_when_ready;
            (changed, state.phase)
        };
        if changed {
            self.notify(EngineCallback::StateChanged { play_when_ready, phase });
        }
    }

    fn seek_to(&mut self, position_ms: u64) {
        let prepared = {
            let mut state = lock(&self.shared);
            state.seeks.push(position_ms);
            state.position_ms = position_ms;
            !state.prepared.is_empty()
        };
        if prepared {
            self.notify(EngineCallback::PositionDiscontinuity);
        }
    }

    fn position_ms(&self) -> u64 {
        lock(&self.shared).position_ms
    }

    fn duration_ms(&self) -> Option<u64> {
        lock(&self.shared).duration_ms
    }

    fn release(&mut self) {
        let mut state = lock(&self.shared);
        state.release_count += 1;
        state.phase = Phase::Idle;
        state.play_when_ready = false;
    }
}

/// Inspects a simulated engine and scripts its callbacks
#[derive(Clone)]
pub struct SimulatedEngineProbe {
    shared: Shared,
    listener: Option<EngineListener>,
}

impl SimulatedEngineProbe {
    pub fn seeks(&self) -> Vec<u64> {
        lock(&self.shared).seeks.clone()
    }

    pub fn prepared(&self) -> Vec<MediaSource> {
        lock(&self.shared).prepared.clone()
    }

    pub fn play_when_ready(&self) -> bool {
        lock(&self.shared).play_when_ready
    }

    pub fn release_count(&self) -> usize {
        lock(&self.shared).release_count
    }

    pub fn is_released(&self) -> bool {
        self.release_count() > 0
    }

    /// Make the next `prepare` fail with a construction error
    pub fn fail_next_prepare(&self, reason: impl Into<String>) {
        lock(&self.shared).fail_next_prepare = Some(reason.into());
    }

    /// Emit a raw callback as if the engine had produced it
    pub fn emit(&self, callback: EngineCallback) {
        if let Some(listener) = &self.listener {
            listener.notify(callback);
        }
    }

    fn enter_phase(&self, phase: Phase) {
        let play_when_ready = {
            let mut state = lock(&self.shared);
            state.phase = phase;
            state.play_when_ready
        };
        self.emit(EngineCallback::StateChanged { play_when_ready, phase });
    }

    /// Enough media buffered to render
    pub fn signal_ready(&self) {
        self.emit(EngineCallback::LoadingChanged { is_loading: false });
        self.enter_phase(Phase::Ready);
    }

    /// Playback reached the end of the primary source
    pub fn signal_ended(&self) {
        {
            let mut state = lock(&self.shared);
            if let Some(duration) = state.duration_ms {
                state.position_ms = duration;
            }
        }
        self.enter_phase(Phase::Ended);
    }

    /// Advance the playhead as rendering would
    pub fn advance(&self, ms: u64) {
        let mut state = lock(&self.shared);
        let next = state.position_ms.saturating_add(ms);
        state.position_ms = match state.duration_ms {
            Some(duration) => next.min(duration),
            None => next,
        };
    }

    /// Report a runtime failure on one of the loaded tracks
    pub fn fail(&self, kind: EngineErrorKind, origin: TrackOrigin, message: impl Into<String>) {
        self.emit(EngineCallback::Error(EngineError::new(kind, origin, message)));
    }
}

/// Creates simulated engines and keeps a probe for each
#[derive(Clone, Default)]
pub struct SimulatedEngineFactory {
    duration_ms: Option<u64>,
    probes: Arc<Mutex<Vec<SimulatedEngineProbe>>>,
    refuse_creation: Arc<Mutex<Option<String>>>,
}

impl SimulatedEngineFactory {
    /// Engines created by this factory report `duration_ms` once prepared
    pub fn new(duration_ms: Option<u64>) -> Self {
        Self {
            duration_ms,
            ..Default::default()
        }
    }

    /// Make every subsequent `create` fail
    pub fn refuse_creation(&self, reason: impl Into<String>) {
        *self
            .refuse_creation
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(reason.into());
    }

    /// Number of engines created so far
    pub fn created(&self) -> usize {
        self.probes.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Probe for the most recently created engine
    pub fn latest(&self) -> Option<SimulatedEngineProbe> {
        self.probes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl EngineFactory for SimulatedEngineFactory {
    fn create(&mut self, listener: EngineListener) -> Result<Box<dyn MediaEngine>> {
        if let Some(reason) = self
            .refuse_creation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Err(Error::Construction(reason));
        }

        debug!(engine = %listener.engine_id(), "Creating simulated engine");
        let (engine, probe) = SimulatedEngine::new(listener, self.duration_ms);
        self.probes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(probe);
        Ok(Box::new(engine))
    }
}
