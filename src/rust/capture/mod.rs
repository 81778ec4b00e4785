pub mod caption;
pub mod raspivid;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use chrono::{DateTime, Local};

use crate::error::CaptureError;

pub use raspivid::Raspivid;

/// Resolves once a stopped capture process has exited or been killed.
pub type ExitWatch = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Starts external capture processes writing to a given file.
pub trait CaptureLauncher: Send {
    fn launch(&mut self, output: &Path) -> Result<Box<dyn CaptureProcess>, CaptureError>;
}

/// A running capture process.
pub trait CaptureProcess: Send {
    fn id(&self) -> Option<u32>;

    /// Asks the process to finish its output and exit. Does not wait for it;
    /// the returned watch does.
    fn interrupt(self: Box<Self>) -> Result<ExitWatch, CaptureError>;
}

/// Output files of one recording, named by its start time so they sort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingPaths {
    pub video: PathBuf,
    pub caption: PathBuf,
}

impl RecordingPaths {
    /// Picks `<dir>/<%Y%m%d_%H%M%S>`, appending `_1`, `_2`, ... while that
    /// name is already on disk or equals `taken`. A suffixed name still sorts
    /// after the plain one.
    pub fn unused(dir: &Path, started_at: &DateTime<Local>, taken: Option<&Path>) -> Self {
        let mut n = 0;
        loop {
            let paths = Self::numbered(dir, started_at, n);
            let in_use = paths.video.exists()
                || paths.caption.exists()
                || taken == Some(paths.video.as_path());
            if !in_use {
                return paths;
            }
            n += 1;
        }
    }

    fn numbered(dir: &Path, started_at: &DateTime<Local>, n: u32) -> Self {
        let mut stem = started_at.format("%Y%m%d_%H%M%S").to_string();
        if n > 0 {
            stem.push_str(&format!("_{}", n));
        }
        let base = dir.join(stem);
        RecordingPaths {
            video: base.with_extension("h264"),
            caption: base.with_extension("srt"),
        }
    }
}
