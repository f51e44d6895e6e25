//! Session handle - runs a controller on its own task
//!
//! Host commands may arrive from any thread. The handle forwards them over a
//! channel to the task that owns the [`SessionController`], so commands and
//! engine signals are applied one at a time.

use crate::config::{ControllerOptions, SessionConfig};
use crate::session::{Lifecycle, SessionController, Signal};
use crate::types::{PlaybackState, SessionId};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

enum Command {
    Create(SessionConfig),
    SetStream {
        uri: Option<String>,
        controller: Option<ControllerOptions>,
    },
    Play,
    Pause,
    SeekTo(i64),
    GetState(oneshot::Sender<PlaybackState>),
    Lifecycle(oneshot::Sender<Lifecycle>),
    Close(oneshot::Sender<()>),
}

enum Step {
    Command(Command),
    Signal(Signal),
}

/// Cloneable, thread-safe handle to a running session
#[derive(Clone)]
pub struct SessionHandle {
    id: SessionId,
    commands: mpsc::UnboundedSender<Command>,
}

impl SessionHandle {
    /// Spawn the controller onto the current tokio runtime
    pub fn spawn(controller: SessionController) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = controller.id();
        let task = tokio::spawn(run(controller, rx));
        (Self { id, commands: tx }, task)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn create_session(&self, config: SessionConfig) {
        self.send(Command::Create(config));
    }

    pub fn set_stream(&self, uri: Option<String>, controller: Option<ControllerOptions>) {
        self.send(Command::SetStream { uri, controller });
    }

    pub fn play(&self) {
        self.send(Command::Play);
    }

    pub fn pause(&self) {
        self.send(Command::Pause);
    }

    pub fn seek_to(&self, target_ms: i64) {
        self.send(Command::SeekTo(target_ms));
    }

    /// Current state; an idle snapshot once the session task has stopped
    pub async fn get_state(&self) -> PlaybackState {
        let (tx, rx) = oneshot::channel();
        self.send(Command::GetState(tx));
        rx.await.unwrap_or_default()
    }

    pub async fn lifecycle(&self) -> Lifecycle {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Lifecycle(tx));
        rx.await.unwrap_or(Lifecycle::Released)
    }

    /// Close the session and wait until it is released
    pub async fn close(&self) {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Close(tx));
        let _ = rx.await;
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!(session_id = %self.id, "Session task gone, command dropped");
        }
    }
}

async fn run(mut controller: SessionController, mut commands: mpsc::UnboundedReceiver<Command>) {
    info!(session_id = %controller.id(), "Session task started");

    loop {
        // Pending engine and surface signals go ahead of new commands
        let step = tokio::select! {
            biased;
            Some(signal) = controller.next_signal() => Step::Signal(signal),
            command = commands.recv() => match command {
                Some(command) => Step::Command(command),
                None => break,
            },
        };

        match step {
            Step::Command(command) => apply(&mut controller, command),
            Step::Signal(signal) => controller.handle_signal(signal),
        }
    }

    // Every handle dropped
    controller.close();
    info!(session_id = %controller.id(), "Session task finished");
}

fn apply(controller: &mut SessionController, command: Command) {
    match command {
        Command::Create(config) => controller.create_session(config),
        Command::SetStream { uri, controller: options } => {
            controller.set_stream(uri.as_deref(), options)
        }
        Command::Play => controller.play(),
        Command::Pause => controller.pause(),
        Command::SeekTo(target_ms) => controller.seek_to(target_ms),
        Command::GetState(reply) => {
            let _ = reply.send(controller.get_state());
        }
        Command::Lifecycle(reply) => {
            let _ = reply.send(controller.lifecycle());
        }
        Command::Close(reply) => {
            controller.close();
            let _ = reply.send(());
        }
    }
}
