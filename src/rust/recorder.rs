use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::capture::caption::write_caption;
use crate::capture::{CaptureLauncher, CaptureProcess, RecordingPaths};
use crate::command::Command;
use crate::config::Config;
use crate::error::{CaptureError, DispatchError};

/// The recording currently in progress.
pub struct RecordingSession {
    pub started_at: DateTime<Local>,
    pub output_path: PathBuf,
    process: Box<dyn CaptureProcess>,
}

/// What a command did to the recording state.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Started {
        output_path: PathBuf,
        caption_written: bool,
    },
    Stopped {
        output_path: PathBuf,
    },
    /// Start while a recording was already running.
    AlreadyRecording,
    /// Stop with nothing to stop.
    NotRecording,
}

/// Owns the single active recording and drives the capture process from
/// the command stream.
pub struct RecordingDispatcher<L> {
    launcher: L,
    recordings_dir: PathBuf,
    caption_duration: Duration,
    commands: mpsc::Receiver<Command>,
    active: Option<RecordingSession>,
    /// Video path of the most recent session, which may not be on disk yet.
    last_output: Option<PathBuf>,
    exits: JoinSet<()>,
}

impl<L: CaptureLauncher> RecordingDispatcher<L> {
    pub fn new(launcher: L, config: &Config, commands: mpsc::Receiver<Command>) -> Self {
        RecordingDispatcher {
            launcher,
            recordings_dir: config.recordings_dir.clone(),
            caption_duration: config.caption_duration,
            commands,
            active: None,
            last_output: None,
            exits: JoinSet::new(),
        }
    }

    pub fn active(&self) -> Option<&RecordingSession> {
        self.active.as_ref()
    }

    /// Processes commands until every sender is gone, then stops whatever is
    /// still recording and waits for stopped processes to exit.
    pub async fn run(mut self) {
        while let Some(cmd) = self.commands.recv().await {
            self.report(cmd);
        }

        if self.active().is_some() {
            warn!("Command stream closed while recording");
            self.report(Command::Stop);
        }
        while self.exits.join_next().await.is_some() {}
        debug!("Recording dispatcher finished");
    }

    fn report(&mut self, cmd: Command) {
        match self.handle_command(cmd) {
            Ok(Outcome::Started {
                output_path,
                caption_written,
            }) => info!(path = %output_path.display(), caption_written, "Recording started"),
            Ok(Outcome::Stopped { output_path }) => {
                info!(path = %output_path.display(), "Recording stopped")
            }
            Ok(Outcome::AlreadyRecording) => warn!("Motion re-triggered while recording, ignored"),
            Ok(Outcome::NotRecording) => debug!("Stop without active recording, ignored"),
            Err(e) => error!(error = %e, "Command failed"),
        }
    }

    pub fn handle_command(&mut self, cmd: Command) -> Result<Outcome, DispatchError> {
        // Reap watchers of processes that already exited.
        while self.exits.try_join_next().is_some() {}

        match cmd {
            Command::Start => self.start(),
            Command::Stop => self.stop(),
            Command::Unknown(text) => Err(DispatchError::UnrecognizedCommand(text)),
        }
    }

    fn start(&mut self) -> Result<Outcome, DispatchError> {
        if self.active.is_some() {
            return Ok(Outcome::AlreadyRecording);
        }

        let started_at = Local::now();
        fs::create_dir_all(&self.recordings_dir).map_err(|source| CaptureError::RecordingsDir {
            path: self.recordings_dir.clone(),
            source,
        })?;
        let paths = RecordingPaths::unused(
            &self.recordings_dir,
            &started_at,
            self.last_output.as_deref(),
        );

        let process = self.launcher.launch(&paths.video)?;
        self.last_output = Some(paths.video.clone());

        let caption_written = match write_caption(&paths.caption, &started_at, self.caption_duration)
        {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Recording continues without caption");
                false
            }
        };

        self.active = Some(RecordingSession {
            started_at,
            output_path: paths.video.clone(),
            process,
        });
        Ok(Outcome::Started {
            output_path: paths.video,
            caption_written,
        })
    }

    fn stop(&mut self) -> Result<Outcome, DispatchError> {
        let session = match self.active.take() {
            Some(session) => session,
            None => return Ok(Outcome::NotRecording),
        };

        let pid = session.process.id();
        let watch = session.process.interrupt()?;
        self.exits.spawn(watch);
        debug!(pid = ?pid, started_at = %session.started_at, "Interrupted capture process");

        Ok(Outcome::Stopped {
            output_path: session.output_path,
        })
    }
}
