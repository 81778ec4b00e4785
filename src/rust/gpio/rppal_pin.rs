use std::io;

use rppal::gpio::{Gpio, InputPin, OutputPin};
use tracing::debug;

use super::{DigitalPin, Direction};
use crate::error::HardwareError;

enum Line {
    Input(InputPin),
    Output(OutputPin),
}

/// A BCM-numbered line driven through `rppal`, without touching sysfs.
pub struct RppalPin {
    id: u32,
    line: Option<Line>,
}

impl RppalPin {
    pub fn open(id: u32, direction: Direction) -> Result<Self, HardwareError> {
        let bcm = u8::try_from(id).map_err(|_| HardwareError::Export {
            id,
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a BCM pin number"),
        })?;
        let pin = Gpio::new()?.get(bcm)?;

        let line = match direction {
            Direction::In => Line::Input(pin.into_input()),
            Direction::Out => Line::Output(pin.into_output()),
        };
        debug!(pin = id, %direction, "Acquired pin");

        Ok(RppalPin {
            id,
            line: Some(line),
        })
    }
}

impl DigitalPin for RppalPin {
    fn id(&self) -> u32 {
        self.id
    }

    fn read(&self) -> Result<bool, HardwareError> {
        match &self.line {
            Some(Line::Input(pin)) => Ok(pin.is_high()),
            Some(Line::Output(pin)) => Ok(pin.is_set_high()),
            None => Err(HardwareError::Read {
                id: self.id,
                source: io::Error::new(io::ErrorKind::NotConnected, "pin already closed"),
            }),
        }
    }

    fn close(&mut self) -> Result<(), HardwareError> {
        // rppal restores the previous mode when the pin is dropped.
        self.line = None;
        Ok(())
    }
}
