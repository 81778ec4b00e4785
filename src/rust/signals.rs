//! Termination signals for the shutdown path.

use std::process;

use anyhow::{Context, Result};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Exit status for a shutdown cut short by a repeated signal.
const FORCED_EXIT_CODE: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignalAction {
    /// Begin the orderly shutdown.
    Shutdown,
    /// Shutdown is already under way; the operator wants out now.
    ForceExit,
}

#[derive(Debug, Default)]
struct SignalCounter {
    received: usize,
}

impl SignalCounter {
    fn on_signal(&mut self) -> SignalAction {
        self.received += 1;
        if self.received == 1 {
            SignalAction::Shutdown
        } else {
            SignalAction::ForceExit
        }
    }
}

/// Returns a receiver that gets a message on the first SIGINT or SIGTERM.
///
/// Registration happens before returning, so a signal delivered afterwards
/// is never lost. Any further signal while shutdown is in progress exits the
/// process immediately.
pub fn setup_signal_handlers() -> Result<mpsc::Receiver<()>> {
    let (tx, rx) = mpsc::channel(1);

    let mut term = signal(SignalKind::terminate()).context("Failed to register SIGTERM handler")?;
    let mut int = signal(SignalKind::interrupt()).context("Failed to register SIGINT handler")?;

    tokio::spawn(async move {
        let mut counter = SignalCounter::default();
        loop {
            let name = tokio::select! {
                Some(()) = term.recv() => "SIGTERM",
                Some(()) = int.recv() => "SIGINT",
                else => break,
            };

            match counter.on_signal() {
                SignalAction::Shutdown => {
                    info!(signal = name, "Received termination signal");
                    let _ = tx.send(()).await;
                }
                SignalAction::ForceExit => {
                    warn!(signal = name, "Received another termination signal, exiting now");
                    process::exit(FORCED_EXIT_CODE);
                }
            }
        }
    });

    Ok(rx)
}
