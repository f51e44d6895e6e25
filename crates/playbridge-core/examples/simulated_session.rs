//! Simulated Session Example
//!
//! Drives a session through the async handle against the simulated engine
//! and prints every client event as it would be delivered to the host.
//!
//! # Usage
//! ```bash
//! cargo run -p playbridge-core --example simulated_session -- https://example.com/show.mpd
//! ```

use anyhow::Result;
use playbridge_core::{
    EventRecord, HeadlessSurfaceProvider, SessionConfig, SessionController, SessionHandle,
    SimulatedEngineFactory, SurfaceSignal, TouchAction,
};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_writer(std::io::stderr)
        .init();

    let uri = env::args()
        .nth(1)
        .unwrap_or_else(|| "https://example.com/show.mpd".to_string());
    println!("Simulating session for: {}", uri);
    println!("{}", "=".repeat(60));

    let engines = SimulatedEngineFactory::new(Some(120_000));
    let surfaces = HeadlessSurfaceProvider::new();
    let (tx, mut rx) = mpsc::unbounded_channel::<EventRecord>();
    let controller = SessionController::new(
        Box::new(engines.clone()),
        Box::new(surfaces.clone()),
        Arc::new(tx),
    );
    let (handle, task) = SessionHandle::spawn(controller);

    let config = SessionConfig::new(uri)
        .with_play_offset(Duration::from_secs(5))
        .with_subtitle("https://example.com/captions.vtt");
    handle.create_session(config);
    handle.lifecycle().await;

    if let Some(engine) = engines.latest() {
        engine.signal_ready();
        engine.advance(30_000);
    }
    handle.seek_to(90_000);
    surfaces.raise(SurfaceSignal::Touch {
        action: TouchAction::Down,
    });

    let state = handle.get_state().await;
    println!("State: {}", serde_json::to_string(&state)?);

    handle.close().await;
    drop(handle);
    task.await?;

    println!("\nClient events:");
    while let Some(record) = rx.recv().await {
        println!("  {}", record.to_json());
    }

    Ok(())
}
