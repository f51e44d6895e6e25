//! Event translation
//!
//! Pure mapping from engine callbacks and surface signals to client events.
//! Playback parameter, timeline, and track changes are not forwarded.

use crate::config::SubtitlePolicy;
use crate::engine::{EngineCallback, EngineError};
use crate::event::Event;
use crate::input;
use crate::source::TrackOrigin;
use crate::surface::SurfaceSignal;
use crate::Error;
use tracing::{debug, error, info, warn};

/// Where an error event comes from; exactly one source per event
#[derive(Debug)]
pub enum ErrorCause<'a> {
    /// Reported by the engine during playback
    Engine(&'a EngineError),
    /// Raised before anything reached the engine
    Local(&'a Error),
}

/// Build the error event for a cause
pub fn error_event(cause: ErrorCause<'_>) -> Event {
    match cause {
        ErrorCause::Engine(err) => Event::Error {
            code: Some(err.kind.code().to_string()),
            message: err.message.clone(),
        },
        ErrorCause::Local(err) => Event::Error {
            code: Some(err.error_code().to_string()),
            message: err.to_string(),
        },
    }
}

/// Translate an engine callback; `None` means the callback is not forwarded
pub fn translate(callback: &EngineCallback, subtitle_policy: SubtitlePolicy) -> Option<Event> {
    match callback {
        EngineCallback::PlaybackParametersChanged { speed, pitch } => {
            info!(speed, pitch, "Playback parameters changed");
            None
        }
        EngineCallback::Error(err) => {
            if err.origin == TrackOrigin::Subtitle && subtitle_policy == SubtitlePolicy::Degrade {
                warn!(error = %err, "Subtitle track failed, continuing without it");
                return None;
            }
            error!(error = %err, "Engine error");
            Some(error_event(ErrorCause::Engine(err)))
        }
        EngineCallback::LoadingChanged { is_loading } => Some(Event::Loading {
            is_loading: *is_loading,
        }),
        EngineCallback::StateChanged { phase, .. } => Some(Event::StateChanged { phase: *phase }),
        EngineCallback::PositionDiscontinuity => Some(Event::PositionDiscontinuity),
        // TODO: forward timeline and track changes once the client protocol defines payloads for them
        EngineCallback::TimelineChanged { duration_ms, is_dynamic } => {
            debug!(duration_ms = ?duration_ms, is_dynamic, "Timeline changed (not forwarded)");
            None
        }
        EngineCallback::TracksChanged { track_count } => {
            debug!(track_count, "Tracks changed (not forwarded)");
            None
        }
    }
}

/// Translate a presentation surface signal
pub fn translate_surface(signal: &SurfaceSignal) -> Option<Event> {
    match signal {
        SurfaceSignal::Dismissed => Some(Event::Stop),
        SurfaceSignal::Key { code, action } => {
            if input::is_system_key(code) {
                return None;
            }
            Some(Event::KeyPress {
                code: code.clone(),
                action: *action,
            })
        }
        SurfaceSignal::Touch { action } => Some(Event::Touch { action: *action }),
    }
}
