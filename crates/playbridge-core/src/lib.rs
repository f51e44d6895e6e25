//! Playbridge Core - Media Session Controller
//!
//! This crate bridges a host application and a media playback engine:
//! - Stream resolution (progressive, DASH, HLS, SmoothStreaming) with side-loaded subtitles
//! - Engine adaptation behind the [`MediaEngine`] trait
//! - Translation of engine callbacks into JSON client events
//! - Session lifecycle with an optional full-screen presentation surface
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Playbridge Core                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  host commands ──► ┌─────────────┐ ──► ┌──────────────┐         │
//! │                    │   Session   │     │   Resolver   │         │
//! │                    │  Controller │     └──────────────┘         │
//! │                    └──┬───────▲──┘                              │
//! │                       │       │ signal queue                    │
//! │              ┌────────▼──┐  ┌─┴────────────┐  ┌─────────────┐   │
//! │              │  Engine   │  │   Engine /   │  │    Event    │   │
//! │              │  Adapter  │  │   Surface    │  │ Translator  │   │
//! │              └───────────┘  └──────────────┘  └──────┬──────┘   │
//! │                                                      │          │
//! │                                   client channel ◄───┘          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod types;
pub mod config;
pub mod resolver;
pub mod source;
pub mod engine;
pub mod event;
pub mod input;
pub mod surface;
pub mod translator;
pub mod session;
pub mod handle;

pub use error::{Error, Result};
pub use types::*;
pub use config::{ControllerOptions, SessionConfig, SubtitlePolicy};
pub use resolver::{resolve, resolve_with_hint, StreamDescriptor, StreamKind, SubtitleFormat, RetryPolicy};
pub use source::{MediaSource, TrackOrigin};
pub use engine::{
    EngineCallback, EngineError, EngineErrorKind, EngineFactory, EngineId, EngineListener,
    MediaEngine, PlaybackAdapter, SimulatedEngineFactory,
};
pub use event::{ClientChannel, Event, EventRecord, RecordingChannel};
pub use surface::{HeadlessSurfaceProvider, PresentationSurface, SurfaceProvider, SurfaceSignal};
pub use session::{Lifecycle, SessionController, Signal};
pub use handle::SessionHandle;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library
pub fn init() {
    tracing::info!(version = VERSION, "Playbridge Core initialized");
}
