//! CLI command implementations

use crate::output::{to_json, OutputFormat};
use crate::script::Step;
use console::style;
use playbridge_core::resolver::probe::ContentProbe;
use playbridge_core::{
    resolve, EngineErrorKind, EventRecord, HeadlessSurfaceProvider, KeyAction, MediaSource,
    RetryPolicy, SessionConfig, SessionController, SessionHandle, SimulatedEngineFactory,
    SurfaceSignal,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use url::Url;

/// Resolve a URI and show the descriptor and engine source
pub async fn resolve_uri(
    uri: &str,
    subtitle: Option<String>,
    mime_type: Option<String>,
    user_agent: Option<String>,
    probe: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let mut config = SessionConfig::new(uri);
    if let Some(subtitle) = subtitle {
        config = config.with_subtitle(subtitle);
    }
    if let Some(user_agent) = user_agent {
        config = config.with_user_agent(user_agent);
    }
    if let Some(mime_type) = mime_type {
        config = config.with_mime_type(mime_type);
    } else if probe {
        let url = Url::parse(uri)?;
        let prober = ContentProbe::new(config.effective_user_agent(), &RetryPolicy::default())?;
        match prober.content_type(&url).await? {
            Some(content_type) => {
                info!(content_type = %content_type, "Probed content type");
                config = config.with_mime_type(content_type);
            }
            None => warn!("Server did not report a content type"),
        }
    }

    let descriptor = resolve(uri, &config)?;
    let source = MediaSource::build(&descriptor);

    match format {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "descriptor": descriptor,
                "source": source,
            });
            println!("{}", to_json(&report));
        }
        OutputFormat::Text => {
            println!("Stream: {}", descriptor.uri);
            println!("  Kind: {}", descriptor.kind);
            println!("  Chunking: {:?}", descriptor.chunking);
            println!("  User agent: {}", descriptor.user_agent);
            println!(
                "  Retries: {} (connect {:?}, read {:?})",
                descriptor.retry_policy.attempts,
                descriptor.retry_policy.connect_timeout,
                descriptor.retry_policy.read_timeout
            );
            match &descriptor.subtitle {
                Some(track) => println!("  Subtitle: {} ({})", track.uri, track.mime_hint()),
                None => println!("  Subtitle: none"),
            }
            println!("\nEngine sources:");
            for (i, uri) in source.uris().iter().enumerate() {
                println!("  {}. {}", i + 1, uri);
            }
        }
    }

    Ok(())
}

/// Validate a host options file
pub fn validate(path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    println!("Validating config: {}", path.display());

    let raw = std::fs::read_to_string(path)?;
    let outcome = SessionConfig::from_json(&raw).and_then(|config| {
        let descriptor = resolve(&config.uri, &config)?;
        Ok((config, descriptor))
    });

    match outcome {
        Ok((config, descriptor)) => {
            match format {
                OutputFormat::Json => println!("{}", to_json(&config)),
                OutputFormat::Text => {
                    println!("  Stream: {} ({})", descriptor.uri, descriptor.kind);
                    println!("  Audio only: {}", config.audio_only);
                    println!("  Play offset: {:?}", config.play_offset);
                    println!("  Subtitle policy: {:?}", config.subtitle_policy);
                }
            }
            println!("\nConfig: {}", style("VALID").green());
            Ok(())
        }
        Err(e) => {
            println!("\nConfig: {} ({}: {})", style("INVALID").red(), e.error_code(), e);
            std::process::exit(1);
        }
    }
}

/// Run a session against the simulated engine and print every client event
pub async fn simulate(
    config: SessionConfig,
    duration_ms: Option<u64>,
    steps: Vec<Step>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let engines = SimulatedEngineFactory::new(duration_ms);
    let surfaces = HeadlessSurfaceProvider::new();
    let (tx, mut rx) = mpsc::unbounded_channel::<EventRecord>();

    let controller = SessionController::new(
        Box::new(engines.clone()),
        Box::new(surfaces.clone()),
        Arc::new(tx),
    );
    let (handle, task) = SessionHandle::spawn(controller);
    info!(session_id = %handle.id(), "Simulated session started");

    let printer = tokio::spawn(async move {
        while let Some(record) = rx.recv().await {
            print_record(&record, format);
        }
    });

    handle.create_session(config);
    barrier(&handle).await;

    for step in steps {
        run_step(&handle, &engines, &surfaces, step).await;
        barrier(&handle).await;
    }

    handle.close().await;
    drop(handle);
    task.await?;
    printer.await?;

    Ok(())
}

async fn run_step(
    handle: &SessionHandle,
    engines: &SimulatedEngineFactory,
    surfaces: &HeadlessSurfaceProvider,
    step: Step,
) {
    let engine = engines.latest();
    let engine_step = matches!(step, Step::Ready | Step::End | Step::Advance(_) | Step::Fail { .. });
    if engine_step && engine.is_none() {
        warn!(?step, "No engine instance, step skipped");
        return;
    }

    match step {
        Step::Play => handle.play(),
        Step::Pause => handle.pause(),
        Step::Seek(target) => handle.seek_to(target),
        Step::SetStream(uri) => handle.set_stream(Some(uri), None),
        Step::State => {
            let state = handle.get_state().await;
            println!("state: {}", serde_json::to_string(&state).unwrap_or_default());
        }
        Step::Close => handle.close().await,
        Step::Ready => engine.iter().for_each(|e| e.signal_ready()),
        Step::End => engine.iter().for_each(|e| e.signal_ended()),
        Step::Advance(ms) => engine.iter().for_each(|e| e.advance(ms)),
        Step::Fail { origin, message } => engine
            .iter()
            .for_each(|e| e.fail(EngineErrorKind::Source, origin, message.clone())),
        Step::Dismiss => surfaces.raise(SurfaceSignal::Dismissed),
        Step::Key(code) => {
            for action in [KeyAction::Down, KeyAction::Up] {
                surfaces.raise(SurfaceSignal::Key {
                    code: code.clone(),
                    action,
                });
            }
        }
        Step::Touch(action) => surfaces.raise(SurfaceSignal::Touch { action }),
        Step::Wait(duration) => tokio::time::sleep(duration).await,
    }
}

/// Round-trip through the session task so earlier commands and signals are applied
async fn barrier(handle: &SessionHandle) {
    let _ = handle.lifecycle().await;
}

fn print_record(record: &EventRecord, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", record.to_json()),
        OutputFormat::Text => {
            let name = if record.is_error() {
                style(record.event.name()).red().to_string()
            } else {
                style(record.event.name()).cyan().to_string()
            };
            let detail = serde_json::to_value(&record.event)
                .ok()
                .and_then(|mut v| {
                    v.as_object_mut()?.remove("type");
                    Some(v)
                })
                .filter(|v| v.as_object().map(|o| !o.is_empty()).unwrap_or(false))
                .map(|v| v.to_string())
                .unwrap_or_default();
            println!("[{:>3}] {} {}", record.sequence, name, detail);
        }
    }
}
