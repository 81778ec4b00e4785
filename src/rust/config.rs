use std::path::PathBuf;
use std::time::Duration;

use crate::gpio::{Direction, PinBackend};

const MOTION_PIN: u32 = 4;
const GPIO_ROOT: &str = "/sys/class/gpio";
const RECORDINGS_DIR: &str = "/data/video";

/// Runtime settings handed to each component at construction.
#[derive(Debug, Clone)]
pub struct Config {
    pub pin: u32,
    pub direction: Direction,
    pub backend: PinBackend,
    /// Root of the sysfs GPIO class, only used by the sysfs backend.
    pub gpio_root: PathBuf,
    pub poll_interval: Duration,
    pub recordings_dir: PathBuf,
    pub capture: CaptureSettings,
    /// End time of the single caption entry written next to each recording.
    pub caption_duration: Duration,
    /// How long a stopped capture process may take to exit before it is killed.
    pub stop_grace: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            pin: MOTION_PIN,
            direction: Direction::In,
            backend: PinBackend::Sysfs,
            gpio_root: PathBuf::from(GPIO_ROOT),
            poll_interval: Duration::from_millis(250),
            recordings_dir: PathBuf::from(RECORDINGS_DIR),
            capture: CaptureSettings::default(),
            caption_duration: Duration::from_secs(60),
            stop_grace: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub program: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Bits per second.
    pub bitrate: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        CaptureSettings {
            program: String::from("raspivid"),
            width: 720,
            height: 480,
            fps: 25,
            bitrate: 250_000,
        }
    }
}
