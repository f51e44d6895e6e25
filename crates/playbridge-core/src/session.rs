//! Session Controller - Main orchestrator for one playback session
//!
//! Coordinates:
//! - Presentation surface lifecycle
//! - Stream resolution and engine preparation
//! - Command routing to the engine adapter
//! - Engine and surface signals through the event translator to the client
//!
//! Engines and surfaces never call into the controller. They queue
//! [`Signal`]s which the controller drains on its own context, so state is
//! only mutated from one place.

use crate::{
    config::{ControllerOptions, SessionConfig, SubtitlePolicy},
    engine::{EngineCallback, EngineFactory, EngineId, EngineListener, PlaybackAdapter},
    event::{ClientChannel, Event, EventRecord},
    input::{self, TouchDeduper},
    resolver,
    source::TrackOrigin,
    surface::{PresentationSurface, SurfaceProvider, SurfaceSignal, SurfaceSignals},
    translator::{self, ErrorCause},
    types::*,
    Error,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, trace, warn};

/// Queued notification from an engine or surface
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Engine { engine: EngineId, callback: EngineCallback },
    Surface(SurfaceSignal),
}

/// Sending half of a session's signal queue
#[derive(Debug, Clone)]
pub struct SignalSender(mpsc::UnboundedSender<Signal>);

impl SignalSender {
    /// Queue a signal; a closed queue means the session is gone and the signal is moot
    pub(crate) fn send(&self, signal: Signal) {
        if self.0.send(signal).is_err() {
            trace!("Signal queue closed");
        }
    }
}

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    Uninitialized,
    Presenting,
    Released,
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lifecycle::Uninitialized => write!(f, "uninitialized"),
            Lifecycle::Presenting => write!(f, "presenting"),
            Lifecycle::Released => write!(f, "released"),
        }
    }
}

/// Player session controller
pub struct SessionController {
    /// Unique session ID
    id: SessionId,
    lifecycle: Lifecycle,
    /// Set by `create_session`
    config: Option<SessionConfig>,
    adapter: PlaybackAdapter,
    surface: Option<Box<dyn PresentationSurface>>,
    engines: Box<dyn EngineFactory>,
    surfaces: Box<dyn SurfaceProvider>,
    channel: Arc<dyn ClientChannel>,
    /// Next event sequence number
    sequence: u64,
    next_engine: u64,
    touch: TouchDeduper,
    signal_tx: SignalSender,
    signal_rx: mpsc::UnboundedReceiver<Signal>,
}

impl SessionController {
    /// Create a controller; nothing is acquired until `create_session`
    pub fn new(
        engines: Box<dyn EngineFactory>,
        surfaces: Box<dyn SurfaceProvider>,
        channel: Arc<dyn ClientChannel>,
    ) -> Self {
        let (tx, signal_rx) = mpsc::unbounded_channel();

        Self {
            id: SessionId::new(),
            lifecycle: Lifecycle::Uninitialized,
            config: None,
            adapter: PlaybackAdapter::new(),
            surface: None,
            engines,
            surfaces,
            channel,
            sequence: 0,
            next_engine: 0,
            touch: TouchDeduper::new(),
            signal_tx: SignalSender(tx),
            signal_rx,
        }
    }

    /// Get session ID
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    /// True while an engine instance exists
    pub fn has_engine(&self) -> bool {
        self.adapter.has_engine()
    }

    /// Start the session: present the surface unless audio-only, then load the stream
    #[instrument(skip(self, config), fields(session_id = %self.id))]
    pub fn create_session(&mut self, config: SessionConfig) {
        match self.lifecycle {
            Lifecycle::Uninitialized => {}
            Lifecycle::Presenting => {
                self.report(&Error::invalid_command("createSession", self.lifecycle));
                return;
            }
            Lifecycle::Released => {
                trace!("createSession after release ignored");
                return;
            }
        }

        info!(uri = %config.uri, audio_only = config.audio_only, "Creating session");
        self.lifecycle = Lifecycle::Presenting;

        if !config.audio_only {
            self.present_surface(&config);
        }

        let uri = config.uri.clone();
        let offset = config.play_offset;
        self.config = Some(config);

        if self.load(&uri, offset) {
            self.emit(Event::Start);
        }
    }

    /// Swap the stream and/or controller options without recreating the session
    #[instrument(skip(self, controller), fields(session_id = %self.id))]
    pub fn set_stream(&mut self, uri: Option<&str>, controller: Option<ControllerOptions>) {
        if !self.ensure_presenting("setStream") {
            return;
        }

        if let Some(uri) = uri {
            info!(uri, "Switching stream");
            self.load(uri, None);
        }

        if let (Some(options), Some(surface)) = (controller, self.surface.as_mut()) {
            surface.configure_controller(&options);
        }
    }

    /// Resume playback
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn play(&mut self) {
        if self.ensure_presenting("play") {
            self.adapter.play();
        }
    }

    /// Pause playback
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn pause(&mut self) {
        if self.ensure_presenting("pause") {
            self.adapter.pause();
        }
    }

    /// Seek to a position in milliseconds; out-of-range targets are clamped
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn seek_to(&mut self, target_ms: i64) {
        if !self.ensure_presenting("seekTo") {
            return;
        }
        if let Some(event) = self.adapter.seek_to(target_ms) {
            self.emit(event);
        }
    }

    /// Current playback state; an idle snapshot outside `Presenting`
    pub fn get_state(&self) -> PlaybackState {
        match self.lifecycle {
            Lifecycle::Presenting => self.adapter.current_state(),
            _ => PlaybackState::default(),
        }
    }

    /// End the session; repeated calls are no-ops
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn close(&mut self) {
        if self.lifecycle == Lifecycle::Released {
            trace!("Session already released");
            return;
        }

        info!("Closing session");
        self.adapter.release();
        if let Some(mut surface) = self.surface.take() {
            surface.dismiss();
        }
        self.finish();
    }

    /// Apply one queued signal
    pub fn handle_signal(&mut self, signal: Signal) {
        if self.lifecycle == Lifecycle::Released {
            trace!(?signal, "Signal after release dropped");
            return;
        }

        match signal {
            Signal::Engine { engine, callback } => self.on_engine(engine, callback),
            Signal::Surface(signal) => self.on_surface(signal),
        }
    }

    /// Apply every signal queued so far; returns how many were handled
    pub fn drain_signals(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(signal) = self.signal_rx.try_recv() {
            self.handle_signal(signal);
            handled += 1;
        }
        handled
    }

    /// Wait for the next queued signal
    pub async fn next_signal(&mut self) -> Option<Signal> {
        self.signal_rx.recv().await
    }

    fn on_engine(&mut self, engine: EngineId, callback: EngineCallback) {
        if self.adapter.engine_id() != Some(engine) {
            debug!(engine = %engine, "Callback from stale engine dropped");
            return;
        }

        self.adapter.observe(&callback);

        let policy = self.subtitle_policy();
        if let EngineCallback::Error(err) = &callback {
            if err.origin == TrackOrigin::Subtitle && policy == SubtitlePolicy::Fatal {
                warn!("Subtitle failure is fatal for this session, pausing");
                self.adapter.pause();
            }
        }

        if let Some(event) = translator::translate(&callback, policy) {
            self.emit(event);
        }
    }

    fn on_surface(&mut self, signal: SurfaceSignal) {
        match &signal {
            SurfaceSignal::Dismissed => {
                info!("Surface dismissed");
                // Already gone on the platform side
                self.surface = None;
                self.adapter.release();
                self.finish();
                return;
            }
            SurfaceSignal::Key { code, action } => {
                if input::is_system_key(code) {
                    return;
                }
                if *action == KeyAction::Up {
                    if let Some(surface) = self.surface.as_mut() {
                        surface.show_controller();
                    }
                }
            }
            SurfaceSignal::Touch { action } => {
                if let Some(surface) = self.surface.as_mut() {
                    surface.show_controller();
                }
                if !self.touch.accept(*action) {
                    return;
                }
            }
        }

        if let Some(event) = translator::translate_surface(&signal) {
            self.emit(event);
        }
    }

    fn present_surface(&mut self, config: &SessionConfig) {
        let signals = SurfaceSignals::new(self.signal_tx.clone());
        let presented = self.surfaces.acquire(signals).and_then(|mut surface| {
            surface.present(config)?;
            surface.configure_controller(&config.controller_options);
            Ok(surface)
        });

        match presented {
            Ok(surface) => self.surface = Some(surface),
            Err(err) => {
                warn!(error = %err, "Continuing without a presentation surface");
                self.report(&err);
            }
        }
    }

    /// Resolve and prepare `uri`; returns true if the engine accepted the source
    fn load(&mut self, uri: &str, offset: Option<Duration>) -> bool {
        let Some(config) = self.config.as_ref() else {
            return false;
        };

        // The configured hint describes the session's own stream only
        let hint = config
            .mime_type
            .as_deref()
            .filter(|_| uri.trim() == config.uri.trim());
        let descriptor = match resolver::resolve_with_hint(uri, config, hint) {
            Ok(descriptor) => descriptor,
            Err(err) => {
                self.report(&err);
                return false;
            }
        };

        if !self.adapter.has_engine() && !self.install_engine() {
            return false;
        }

        match self.adapter.prepare(&descriptor, offset) {
            Ok(()) => true,
            Err(err) => {
                self.report(&err);
                false
            }
        }
    }

    fn install_engine(&mut self) -> bool {
        self.next_engine += 1;
        let id = EngineId(self.next_engine);
        let listener = EngineListener::new(id, self.signal_tx.clone());

        match self.engines.create(listener) {
            Ok(engine) => {
                self.adapter.install(id, engine);
                if let Some(surface) = self.surface.as_mut() {
                    surface.attach(id);
                }
                true
            }
            Err(err) => {
                self.report(&err);
                false
            }
        }
    }

    /// Guard for commands that need a live session
    fn ensure_presenting(&mut self, command: &str) -> bool {
        match self.lifecycle {
            Lifecycle::Presenting => true,
            Lifecycle::Released => {
                trace!(command, "Command after release ignored");
                false
            }
            Lifecycle::Uninitialized => {
                self.report(&Error::invalid_command(command, self.lifecycle));
                false
            }
        }
    }

    fn finish(&mut self) {
        self.emit(Event::Stop);
        self.lifecycle = Lifecycle::Released;
        info!("Session released");
    }

    fn subtitle_policy(&self) -> SubtitlePolicy {
        self.config
            .as_ref()
            .map(|c| c.subtitle_policy)
            .unwrap_or_default()
    }

    fn report(&mut self, err: &Error) {
        warn!(code = err.error_code(), error = %err, "Reporting session error");
        self.emit(translator::error_event(ErrorCause::Local(err)));
    }

    fn emit(&mut self, event: Event) {
        if self.lifecycle == Lifecycle::Released {
            trace!(event = event.name(), "Event after release suppressed");
            return;
        }

        let state = self.adapter.has_engine().then(|| self.adapter.current_state());
        let record = EventRecord {
            session_id: self.id,
            sequence: self.sequence,
            timestamp: Utc::now(),
            event,
            state,
        };
        self.sequence += 1;

        debug!(event = record.event.name(), sequence = record.sequence, "Emitting event");
        self.channel.send(record);
    }
}
