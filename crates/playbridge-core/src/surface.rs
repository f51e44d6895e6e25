//! Presentation surface seam
//!
//! A full-screen window owned by the host platform. The controller presents
//! and dismisses it; the surface reports dismissal and user input back as
//! [`SurfaceSignal`]s through the session's signal queue.

use crate::config::{ControllerOptions, SessionConfig};
use crate::engine::EngineId;
use crate::session::{Signal, SignalSender};
use crate::types::{KeyAction, TouchAction};
use crate::Result;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Signals raised by a presentation surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceSignal {
    /// Closed by the user or the OS
    Dismissed,
    Key { code: String, action: KeyAction },
    Touch { action: TouchAction },
}

/// Handed to a surface when it is acquired
#[derive(Debug, Clone)]
pub struct SurfaceSignals {
    signals: SignalSender,
}

impl SurfaceSignals {
    pub(crate) fn new(signals: SignalSender) -> Self {
        Self { signals }
    }

    pub fn notify(&self, signal: SurfaceSignal) {
        self.signals.send(Signal::Surface(signal));
    }
}

/// A full-screen playback surface
pub trait PresentationSurface: Send {
    /// Show the surface for a session
    fn present(&mut self, config: &SessionConfig) -> Result<()>;

    /// Route the engine's video output to this surface
    fn attach(&mut self, engine: EngineId);

    /// Apply client-facing control options
    fn configure_controller(&mut self, options: &ControllerOptions);

    fn show_controller(&mut self);

    /// Close the surface; must not fail
    fn dismiss(&mut self);
}

/// Acquires presentation surfaces for sessions
pub trait SurfaceProvider: Send {
    fn acquire(&mut self, signals: SurfaceSignals) -> Result<Box<dyn PresentationSurface>>;
}

/// Calls recorded by a headless surface
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceLog {
    pub presented: usize,
    pub dismissed: usize,
    pub controller_shown: usize,
    pub attached: Vec<EngineId>,
    pub controller_options: Vec<ControllerOptions>,
}

/// Surface that renders nothing and records every call
pub struct HeadlessSurface {
    log: Arc<Mutex<SurfaceLog>>,
}

impl PresentationSurface for HeadlessSurface {
    fn present(&mut self, config: &SessionConfig) -> Result<()> {
        debug!(uri = %config.uri, "Headless surface presented");
        lock(&self.log).presented += 1;
        Ok(())
    }

    fn attach(&mut self, engine: EngineId) {
        lock(&self.log).attached.push(engine);
    }

    fn configure_controller(&mut self, options: &ControllerOptions) {
        lock(&self.log).controller_options.push(options.clone());
    }

    fn show_controller(&mut self) {
        lock(&self.log).controller_shown += 1;
    }

    fn dismiss(&mut self) {
        lock(&self.log).dismissed += 1;
    }
}

/// Provides headless surfaces and lets callers raise signals on the latest one
#[derive(Clone, Default)]
pub struct HeadlessSurfaceProvider {
    log: Arc<Mutex<SurfaceLog>>,
    signals: Arc<Mutex<Option<SurfaceSignals>>>,
    acquired: Arc<Mutex<usize>>,
}

impl HeadlessSurfaceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of surfaces acquired
    pub fn acquired(&self) -> usize {
        *self.acquired.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn log(&self) -> SurfaceLog {
        lock(&self.log).clone()
    }

    /// Raise a signal as the platform would; ignored if no surface was acquired
    pub fn raise(&self, signal: SurfaceSignal) {
        if let Some(signals) = self
            .signals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            signals.notify(signal);
        }
    }
}

impl SurfaceProvider for HeadlessSurfaceProvider {
    fn acquire(&mut self, signals: SurfaceSignals) -> Result<Box<dyn PresentationSurface>> {
        *self.signals.lock().unwrap_or_else(PoisonError::into_inner) = Some(signals);
        *self.acquired.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(Box::new(HeadlessSurface {
            log: self.log.clone(),
        }))
    }
}

fn lock(log: &Arc<Mutex<SurfaceLog>>) -> MutexGuard<'_, SurfaceLog> {
    log.lock().unwrap_or_else(PoisonError::into_inner)
}
