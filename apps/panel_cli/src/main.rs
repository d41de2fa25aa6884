use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use panel_core::{startup, PanelOptions};
use tracing::info;

mod config;
mod replay;
mod terminal;

use replay::{input_for, ReplayClient, ReplayTarget, SessionFixture, StepInput};
use terminal::TerminalSurface;

/// Replays a recorded debugging session through the debugger panel and prints
/// every rendered frame.
#[derive(Parser, Debug)]
struct Args {
    /// Session fixture (JSON) with sources, rejected breakpoints and steps.
    #[arg(long)]
    session: PathBuf,
    #[arg(long, default_value = "panel.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = config::load_settings(&args.config);
    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .with_writer(std::io::stderr)
        .init();

    let fixture = SessionFixture::load(&args.session)?;
    let client = Arc::new(ReplayClient::new(&fixture, settings.event_capacity));
    let target = ReplayTarget::new(Arc::clone(&client));
    let surface = TerminalSurface::new(&settings.editor_config(), std::io::stdout());
    let frames = surface.subscribe();

    let options = PanelOptions {
        action_queue_capacity: settings.action_queue_capacity,
        ..PanelOptions::default()
    };
    let handle = startup(&target, surface, options).await?;
    handle.flush().await?;

    for (index, step) in fixture.steps.iter().enumerate() {
        info!(step = index + 1, ?step, "replaying step");
        let view = frames
            .borrow()
            .clone()
            .context("panel has not rendered a frame")?;
        match input_for(step, &view)? {
            StepInput::Action(action) => handle.dispatch(action)?,
            StepInput::Event(event) => client.emit(event),
        }
        handle.flush().await?;
    }

    let teardown = handle.shutdown().await?;
    println!(
        "== {} frames, released {:?} ==",
        teardown.surface.frames(),
        teardown.released
    );
    for location in teardown.state.breakpoints.locations() {
        let status = match teardown.state.breakpoints.get(&location) {
            Some(entry) if entry.is_failed() => "failed",
            _ => "active",
        };
        println!("breakpoint {location} {status}");
    }
    println!("installed in target: {}", client.installed().await.len());

    Ok(())
}
