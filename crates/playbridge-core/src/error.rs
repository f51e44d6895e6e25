//! Error types for Playbridge Core

use thiserror::Error;

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, Error>;

/// Session error types
#[derive(Error, Debug)]
pub enum Error {
    // Resolver errors
    #[error("Unsupported stream: {0}")]
    UnsupportedStream(String),

    // Engine errors
    #[error("Failed to construct media source: {0}")]
    Construction(String),

    #[error("Engine error ({code}): {message}")]
    EngineRuntime { code: String, message: String },

    // Command errors
    #[error("Command '{command}' is not valid while session is {state}")]
    InvalidCommand { command: String, state: String },

    // Presentation errors
    #[error("Presentation surface unavailable: {0}")]
    Surface(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Network errors
    #[cfg(feature = "probe")]
    #[error("Probe failed: {0}")]
    Probe(#[from] reqwest::Error),
}

impl Error {
    /// Create an unsupported-stream error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Error::UnsupportedStream(msg.into())
    }

    /// Create an invalid-command error
    pub fn invalid_command(command: &str, state: impl ToString) -> Self {
        Error::InvalidCommand {
            command: command.to_string(),
            state: state.to_string(),
        }
    }

    /// Returns true if the error was raised before reaching the engine
    pub fn is_local(&self) -> bool {
        !matches!(self, Error::EngineRuntime { .. })
    }

    /// Returns the error code reported to the client
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::UnsupportedStream(_) => "UNSUPPORTED_STREAM",
            Error::Construction(_) => "CONSTRUCTION",
            Error::EngineRuntime { .. } => "ENGINE_RUNTIME",
            Error::InvalidCommand { .. } => "INVALID_COMMAND",
            Error::Surface(_) => "SURFACE",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Json(_) => "JSON",
            #[cfg(feature = "probe")]
            Error::Probe(_) => "PROBE",
        }
    }
}
