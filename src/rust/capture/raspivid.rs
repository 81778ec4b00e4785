use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::time;
use tracing::{error, info, warn};

use super::{CaptureLauncher, CaptureProcess, ExitWatch};
use crate::config::CaptureSettings;
use crate::error::CaptureError;

/// Launches `raspivid` in continuous mode for each recording.
pub struct Raspivid {
    settings: CaptureSettings,
    stop_grace: Duration,
}

impl Raspivid {
    pub fn new(settings: CaptureSettings, stop_grace: Duration) -> Self {
        Raspivid {
            settings,
            stop_grace,
        }
    }

    pub fn args(&self, output: &Path) -> Vec<OsString> {
        let s = &self.settings;
        let mut args: Vec<OsString> = vec!["-t".into(), "0".into(), "-o".into()];
        args.push(output.as_os_str().to_owned());
        for (flag, value) in [
            ("-w", s.width),
            ("-h", s.height),
            ("-fps", s.fps),
            ("-b", s.bitrate),
        ] {
            args.push(flag.into());
            args.push(value.to_string().into());
        }
        args
    }
}

impl CaptureLauncher for Raspivid {
    fn launch(&mut self, output: &Path) -> Result<Box<dyn CaptureProcess>, CaptureError> {
        let process = spawn(&self.settings.program, self.args(output), self.stop_grace)?;

        info!(
            pid = ?process.id(),
            "Started {} {}x{} @ {}fps, {}bps",
            self.settings.program,
            self.settings.width,
            self.settings.height,
            self.settings.fps,
            self.settings.bitrate
        );
        Ok(Box::new(process))
    }
}

/// Starts the capture program. A process whose handle is dropped without a
/// completed stop is killed, so nothing outlives the controller.
fn spawn(
    program: &str,
    args: Vec<OsString>,
    stop_grace: Duration,
) -> Result<RaspividProcess, CaptureError> {
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| CaptureError::Launch {
            program: program.to_string(),
            source,
        })?;
    Ok(RaspividProcess { child, stop_grace })
}

struct RaspividProcess {
    child: Child,
    stop_grace: Duration,
}

impl CaptureProcess for RaspividProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn interrupt(self: Box<Self>) -> Result<ExitWatch, CaptureError> {
        let RaspividProcess {
            mut child,
            stop_grace,
        } = *self;
        let pid = child.id().ok_or(CaptureError::NoProcessId)?;

        if let Err(source) = send_sigint(pid) {
            if let Err(e) = child.start_kill() {
                error!(pid, error = %e, "Failed to kill capture process");
            }
            return Err(CaptureError::Interrupt { pid, source });
        }

        Ok(Box::pin(async move {
            match time::timeout(stop_grace, child.wait()).await {
                Ok(Ok(status)) => info!(pid, %status, "Capture process exited"),
                Ok(Err(e)) => warn!(pid, error = %e, "Failed waiting for capture process"),
                Err(_) => {
                    warn!(pid, grace = ?stop_grace, "Capture process ignored interrupt, killing");
                    if let Err(e) = child.kill().await {
                        error!(pid, error = %e, "Failed to kill capture process");
                    }
                }
            }
        }))
    }
}

fn send_sigint(pid: u32) -> io::Result<()> {
    let pid = libc::pid_t::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
    // SAFETY: kill(2) takes plain integers and has no memory-safety preconditions.
    if unsafe { libc::kill(pid, libc::SIGINT) } == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}
