//! Motion-triggered video recorder.
//!
//! Watches a PIR sensor on a GPIO line and records video with `raspivid`
//! while motion is present, until SIGINT or SIGTERM.

mod capture;
mod command;
mod config;
mod detector;
mod error;
mod gpio;
mod recorder;
mod signals;

use std::process::ExitCode;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::time;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use capture::{CaptureLauncher, Raspivid};
use config::Config;
use detector::EdgeDetector;
use gpio::DigitalPin;
use recorder::RecordingDispatcher;

#[tokio::main]
async fn main() -> ExitCode {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pir_video=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "PIR-controlled video recording controller"
    );

    match run(Config::default()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<()> {
    let shutdown = signals::setup_signal_handlers()?;
    let pin = gpio::open_pin(&config)
        .with_context(|| format!("Failed to open motion sensor on pin {}", config.pin))?;
    info!(pin = pin.id(), backend = ?config.backend, "Motion sensor ready");

    let launcher = Raspivid::new(config.capture.clone(), config.stop_grace);
    supervise(&config, pin, launcher, shutdown).await
}

/// Wires the detector to the dispatcher and blocks until shutdown completes.
///
/// The pin is always closed before returning, whatever ended the detector.
async fn supervise<L>(
    config: &Config,
    pin: Box<dyn DigitalPin>,
    launcher: L,
    shutdown: mpsc::Receiver<()>,
) -> Result<()>
where
    L: CaptureLauncher + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::channel(1);
    let (done_tx, done_rx) = oneshot::channel();

    let dispatcher = RecordingDispatcher::new(launcher, config, cmd_rx);
    let dispatcher_task = tokio::spawn(dispatcher.run());

    let detector = EdgeDetector::new(pin, config.poll_interval, cmd_tx, shutdown);
    let detector_task = tokio::spawn(detector.run(done_tx));

    if done_rx.await.is_err() {
        warn!("Motion detector ended without signalling completion");
    }
    let (mut pin, outcome) = detector_task.await.context("Motion detector task failed")?;

    if let Err(e) = pin.close() {
        warn!(error = %e, "Failed to release motion sensor pin");
    }
    info!(pin = pin.id(), "Motion sensor released");

    // The detector dropped its sender, so the dispatcher drains and exits.
    let wait = config.stop_grace + config.poll_interval;
    if time::timeout(wait, dispatcher_task).await.is_err() {
        warn!("Recording dispatcher did not finish in time");
    }

    outcome.context("Motion sensor failed")
}
