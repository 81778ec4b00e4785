pub mod rppal_pin;
pub mod sysfs;

use std::fmt;

use crate::config::Config;
use crate::error::HardwareError;

pub use rppal_pin::RppalPin;
pub use sysfs::SysfsPin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Direction::In => write!(f, "in"),
            Direction::Out => write!(f, "out"),
        }
    }
}

/// Which driver owns the GPIO line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinBackend {
    /// `/sys/class/gpio` export/unexport interface.
    Sysfs,
    /// Direct register access through `rppal`. Never the default; set it in
    /// `Config` on kernels built without the sysfs GPIO class.
    #[allow(dead_code)]
    Rppal,
}

/// One GPIO line, opened exclusively by this process.
pub trait DigitalPin: Send {
    fn id(&self) -> u32;

    /// Samples the line; `true` means logical high.
    fn read(&self) -> Result<bool, HardwareError>;

    /// Releases the line. Calling it again is a no-op.
    fn close(&mut self) -> Result<(), HardwareError>;
}

pub fn open_pin(config: &Config) -> Result<Box<dyn DigitalPin>, HardwareError> {
    match config.backend {
        PinBackend::Sysfs => Ok(Box::new(SysfsPin::open(
            &config.gpio_root,
            config.pin,
            config.direction,
        )?)),
        PinBackend::Rppal => Ok(Box::new(RppalPin::open(config.pin, config.direction)?)),
    }
}
