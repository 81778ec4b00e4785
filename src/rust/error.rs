use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::gpio::Direction;

/// Failures talking to the GPIO line behind the motion sensor.
#[derive(Debug, Error)]
pub enum HardwareError {
    #[error("failed to export pin {id}: {source}")]
    Export { id: u32, source: io::Error },

    #[error("failed to unexport pin {id}: {source}")]
    Unexport { id: u32, source: io::Error },

    #[error("failed to set direction of pin {id} to '{direction}': {source}")]
    Direction {
        id: u32,
        direction: Direction,
        source: io::Error,
    },

    #[error("failed to read from pin {id}: {source}")]
    Read { id: u32, source: io::Error },

    #[error("pin {id} produced no data after {attempts} reads")]
    NoData { id: u32, attempts: usize },

    #[error("gpio error: {0}")]
    Gpio(#[from] rppal::gpio::Error),
}

/// Failures starting or stopping the external capture process.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to launch {program}: {source}")]
    Launch { program: String, source: io::Error },

    #[error("failed to create recordings directory {}: {source}", .path.display())]
    RecordingsDir { path: PathBuf, source: io::Error },

    #[error("failed to interrupt capture process {pid}: {source}")]
    Interrupt { pid: u32, source: io::Error },

    #[error("capture process has no pid (already reaped)")]
    NoProcessId,
}

#[derive(Debug, Error)]
#[error("failed to write caption {}: {source}", .path.display())]
pub struct ArtifactError {
    pub path: PathBuf,
    pub source: io::Error,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("unsupported command: {0}")]
    UnrecognizedCommand(String),
}
