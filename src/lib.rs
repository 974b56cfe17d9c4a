pub mod alerts;
pub mod analysis;
pub mod capture;
pub mod cli;
pub mod detection;
pub mod settings;
mod utils;

use std::future::Future;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use tokio::sync::broadcast::{self, error::RecvError};

use alerts::{FanoutAlertSink, WebhookAlertSink};
use analysis::{AnalysisController, LoopOptions, MonitorEvent};
use capture::{CameraDevice, CameraHandle, CommandFrameSource, DirectoryFrameSource};
use cli::Cli;
use detection::{ClassifierConfig, GeminiClient, HazardClassifier, MockGenerator};
use settings::{api_key_from_env, SettingsStore};

pub type Monitor = AnalysisController<CameraHandle<CameraDevice>, GeminiClient, FanoutAlertSink>;

pub fn run() -> Result<()> {
    utils::logging::init();

    log::info!("HawkWatch starting up...");

    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(watch(cli))
}

/// Wires settings, camera, classifier and alert sinks into one controller.
pub fn build_monitor(cli: &Cli) -> Result<Monitor> {
    let store = SettingsStore::new(cli.settings.clone())?;
    let mut settings = store.settings();
    if let Some(interval_ms) = cli.interval_ms {
        settings.interval_ms = interval_ms;
    }
    if cli.save_settings {
        store.update(settings.clone())?;
        info!("Saved settings to {}", cli.settings.display());
    }

    let camera = camera_from_cli(cli, settings.jpeg_quality)?;

    let classifier = HazardClassifier::from_config(
        ClassifierConfig::from_settings(&settings, api_key_from_env()),
        MockGenerator::from_entropy(),
    )?;

    let webhook = settings
        .webhook_url
        .as_deref()
        .map(WebhookAlertSink::new)
        .transpose()?;

    Ok(AnalysisController::new(
        camera,
        classifier,
        FanoutAlertSink::new(webhook),
        LoopOptions::from_settings(&settings),
    ))
}

fn camera_from_cli(cli: &Cli, quality: u8) -> Result<CameraHandle<CameraDevice>> {
    if let Some(dir) = &cli.frames_dir {
        return Ok(CameraHandle::new(CameraDevice::Directory(
            DirectoryFrameSource::new(dir.clone(), quality),
        )));
    }
    if let Some(command_line) = &cli.capture_cmd {
        return Ok(CameraHandle::new(CameraDevice::Command(
            CommandFrameSource::parse(command_line, quality)?,
        )));
    }

    warn!("No camera configured (--frames-dir or --capture-cmd); every cycle will be skipped");
    Ok(CameraHandle::unavailable())
}

async fn watch(cli: Cli) -> Result<()> {
    let monitor = build_monitor(&cli)?;
    if monitor.is_demo_mode() {
        warn!("HAWKWATCH_API_KEY not set; events are simulated (demo mode)");
    }

    monitor.set_transcript(cli.transcript.clone());
    let mut updates = monitor.subscribe();
    monitor.start().await?;

    relay_updates(&mut updates, cli.cycles, tokio::signal::ctrl_c()).await?;

    monitor.shutdown().await?;

    let snapshot = monitor.snapshot().await;
    info!(
        "Session {} ended: {} cycles, {} skipped, {} events, {} alerts",
        snapshot.state.session_id.unwrap_or_default(),
        snapshot.state.cycles_completed,
        snapshot.state.cycles_skipped,
        snapshot.event_count,
        snapshot.state.alerts_dispatched
    );
    Ok(())
}

/// Prints detected events as JSON lines until `interrupted` resolves, the
/// channel closes, or `cycle_limit` cycles have run. Skipped cycles count.
async fn relay_updates(
    updates: &mut broadcast::Receiver<MonitorEvent>,
    cycle_limit: Option<u64>,
    interrupted: impl Future<Output = std::io::Result<()>>,
) -> Result<u64> {
    tokio::pin!(interrupted);
    let mut cycles_run = 0;

    loop {
        tokio::select! {
            signal = &mut interrupted => {
                signal.context("failed to listen for Ctrl-C")?;
                info!("Interrupt received, stopping analysis");
                break;
            }
            update = updates.recv() => match update {
                Ok(MonitorEvent::EventDetected(event)) => {
                    println!("{}", serde_json::to_string(&event)?);
                }
                Ok(MonitorEvent::CycleFinished { .. } | MonitorEvent::CycleSkipped { .. }) => {
                    cycles_run += 1;
                    if cycle_limit.is_some_and(|limit| cycles_run >= limit) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(missed)) => warn!("Timeline output fell behind, {missed} updates dropped"),
                Err(RecvError::Closed) => break,
            }
        }
    }
    Ok(cycles_run)
}
