//! Catpoint Panel - Main Entry Point

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use catpoint_panel::console::Console;
use catpoint_panel::engine::{CameraImage, HeuristicCatClassifier};
use catpoint_panel::listener::{BroadcastListener, LoggingListener, PanelEvent};
use catpoint_panel::logging::init_logging;
use catpoint_panel::{AlarmDecisionEngine, Config, InMemoryRepository};

#[derive(Parser)]
#[command(name = "catpoint-panel", version, about = "Home security panel simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the interactive console on stdin/stdout
    Run {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Classify a single image file
    CheckImage {
        path: PathBuf,
        #[arg(long)]
        threshold: Option<f32>,
    },
    /// Print the version
    Version,
}

async fn run_console(config: Config) -> anyhow::Result<()> {
    info!("Starting Catpoint panel...");

    let repository = InMemoryRepository::with_capacity(config.max_sensors)
        .with_arming_status(config.initial_arming_status);
    let mut engine = AlarmDecisionEngine::new(Arc::new(repository), Arc::new(HeuristicCatClassifier::new()))
        .with_threshold(config.confidence_threshold);

    let broadcast = Arc::new(BroadcastListener::new(64));
    let mut events = broadcast.subscribe();
    engine.add_status_listener(Arc::new(LoggingListener));
    engine.add_status_listener(broadcast.clone());
    info!(
        threshold = config.confidence_threshold,
        max_sensors = config.max_sensors,
        arming = %config.initial_arming_status,
        "Decision engine initialized"
    );

    let event_handle = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => log_event(&event),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event logger lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let console = Console::new(engine.into_shared());
    let mut stdout = tokio::io::stdout();
    write_line(&mut stdout, &console.welcome()).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let outcome = console.process_command(&line);
        write_line(&mut stdout, &outcome.response).await?;
        if outcome.quit {
            break;
        }
    }

    // dropping the console releases the last sender
    drop(console);
    drop(broadcast);
    let _ = event_handle.await;

    info!("Catpoint panel stopped");
    Ok(())
}

fn log_event(event: &PanelEvent) {
    match serde_json::to_string(event) {
        Ok(json) => debug!(event = %json, "Panel event"),
        Err(e) => warn!("Could not encode panel event: {}", e),
    }
}

async fn write_line(stdout: &mut tokio::io::Stdout, value: &serde_json::Value) -> anyhow::Result<()> {
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    stdout.write_all(&line).await?;
    stdout.flush().await?;
    Ok(())
}

fn check_image(path: &Path, threshold: f32) -> anyhow::Result<()> {
    let image = CameraImage::from_file(path).with_context(|| format!("reading {}", path.display()))?;
    let analysis = HeuristicCatClassifier::new().analyze(&image)?;

    let report = serde_json::json!({
        "path": path.display().to_string(),
        "confidence": analysis.confidence,
        "threshold": threshold,
        "contains_cat": analysis.is_cat(threshold),
        "features": analysis.features,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run { config } => {
            let config = Config::load(config.as_deref()).context("loading configuration")?;
            let _guard = init_logging(&config.logging);

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_console(config))
        }
        Command::CheckImage { path, threshold } => {
            let config = Config::load(None).context("loading configuration")?;
            let threshold = threshold.unwrap_or(config.confidence_threshold);
            if !(0.0..=100.0).contains(&threshold) {
                anyhow::bail!("threshold must be within 0..=100, got {}", threshold);
            }
            check_image(&path, threshold)
        }
        Command::Version => {
            println!("catpoint-panel {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
