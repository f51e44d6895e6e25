//! Playbridge CLI - Headless session driver
//!
//! Features:
//! - Stream resolution preview (kind, chunking, retry policy, subtitles)
//! - Host options validation
//! - Scripted sessions against the simulated engine

use clap::{Parser, Subcommand};
use playbridge_core::SessionConfig;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;
mod script;

use output::OutputFormat;
use script::Step;

/// Playbridge CLI - Media session toolkit
#[derive(Parser)]
#[command(name = "playbridge")]
#[command(author = "Purple Squirrel Media")]
#[command(version)]
#[command(about = "Resolve streams and drive simulated media sessions", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, global = true, default_value = "text")]
    format: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how a URI would be handed to the engine
    Resolve {
        /// Stream URI
        uri: String,

        /// Side-loaded subtitle URI
        #[arg(short, long)]
        subtitle: Option<String>,

        /// MIME type hint, overrides path inference
        #[arg(short, long)]
        mime: Option<String>,

        /// Host user agent prefix
        #[arg(short, long)]
        user_agent: Option<String>,

        /// Ask the server for the content type when no hint is given
        #[arg(long)]
        probe: bool,
    },

    /// Validate a host options JSON file
    Validate {
        /// Path to options file
        config: PathBuf,
    },

    /// Run a scripted session against the simulated engine
    Simulate {
        /// Stream URI
        #[arg(required_unless_present = "config")]
        uri: Option<String>,

        /// Read host options from a JSON file instead
        #[arg(short, long, conflicts_with = "uri")]
        config: Option<PathBuf>,

        /// Play without a presentation surface
        #[arg(short, long)]
        audio_only: bool,

        /// Side-loaded subtitle URI
        #[arg(long)]
        subtitle: Option<String>,

        /// Initial play offset in milliseconds
        #[arg(long)]
        offset_ms: Option<u64>,

        /// Simulated media duration in milliseconds
        #[arg(short, long, default_value = "60000")]
        duration_ms: u64,

        /// Simulate a stream with unknown duration
        #[arg(long)]
        live: bool,

        /// Script step, repeatable (play, pause, seek:MS, stream:URI, state, close,
        /// ready, end, advance:MS, fail[:MSG], fail-subtitle[:MSG], dismiss,
        /// key:CODE, touch:ACTION, wait:MS)
        #[arg(short, long = "step")]
        steps: Vec<Step>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for command output
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    playbridge_core::init();
    let format = OutputFormat::from(cli.format.as_str());

    match cli.command {
        Commands::Resolve { uri, subtitle, mime, user_agent, probe } => {
            commands::resolve_uri(&uri, subtitle, mime, user_agent, probe, format).await?;
        }
        Commands::Validate { config } => {
            commands::validate(&config, format)?;
        }
        Commands::Simulate {
            uri,
            config,
            audio_only,
            subtitle,
            offset_ms,
            duration_ms,
            live,
            steps,
        } => {
            let mut session = match (config, uri) {
                (Some(path), _) => SessionConfig::from_json(&std::fs::read_to_string(path)?)?,
                (None, Some(uri)) => SessionConfig::new(uri),
                (None, None) => anyhow::bail!("a stream URI or --config is required"),
            };
            if audio_only {
                session = session.audio_only(true);
            }
            if let Some(subtitle) = subtitle {
                session = session.with_subtitle(subtitle);
            }
            if let Some(offset) = offset_ms {
                session = session.with_play_offset(Duration::from_millis(offset));
            }
            let duration = if live { None } else { Some(duration_ms) };
            commands::simulate(session, duration, steps, format).await?;
        }
    }

    Ok(())
}
