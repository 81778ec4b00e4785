//! GPIO access through the legacy sysfs class interface.
//!
//! A line is exported by writing its number to `<root>/export`, after which
//! the kernel creates `<root>/gpio<N>/{direction,value}`. Writing the number
//! to `<root>/unexport` removes it again.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{DigitalPin, Direction};
use crate::error::HardwareError;

/// Consecutive empty reads tolerated before the value file is considered broken.
const MAX_EMPTY_READS: usize = 16;

#[derive(Debug)]
pub struct SysfsPin {
    id: u32,
    direction: Direction,
    root: PathBuf,
    pin_path: PathBuf,
    direction_file: Option<File>,
    exported: bool,
}

impl SysfsPin {
    pub fn open(root: &Path, id: u32, direction: Direction) -> Result<Self, HardwareError> {
        export(root, id)?;

        // From here on the line is exported, so a failure must hand it back.
        let mut pin = SysfsPin {
            id,
            direction,
            root: root.to_path_buf(),
            pin_path: root.join(format!("gpio{}", id)),
            direction_file: None,
            exported: true,
        };
        pin.set_direction()?;

        debug!(pin = id, %direction, "Exported pin");
        Ok(pin)
    }

    fn set_direction(&mut self) -> Result<(), HardwareError> {
        let dir_err = |source| HardwareError::Direction {
            id: self.id,
            direction: self.direction,
            source,
        };
        let mut file = OpenOptions::new()
            .write(true)
            .open(self.pin_path.join("direction"))
            .map_err(dir_err)?;
        file.write_all(self.direction.to_string().as_bytes())
            .map_err(dir_err)?;
        self.direction_file = Some(file);
        Ok(())
    }
}

impl DigitalPin for SysfsPin {
    fn id(&self) -> u32 {
        self.id
    }

    fn read(&self) -> Result<bool, HardwareError> {
        let read_err = |source| HardwareError::Read {
            id: self.id,
            source,
        };
        let mut value = File::open(self.pin_path.join("value")).map_err(read_err)?;
        let mut buf = [0u8; 4];

        let mut empty_reads = 0;
        loop {
            match value.read(&mut buf) {
                Ok(0) => {
                    empty_reads += 1;
                    if empty_reads >= MAX_EMPTY_READS {
                        return Err(HardwareError::NoData {
                            id: self.id,
                            attempts: empty_reads,
                        });
                    }
                    value.seek(SeekFrom::Start(0)).map_err(read_err)?;
                }
                Ok(_) => return Ok(buf[0] == b'1'),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(read_err(e)),
            }
        }
    }

    fn close(&mut self) -> Result<(), HardwareError> {
        if !self.exported {
            return Ok(());
        }
        self.direction_file = None;
        self.exported = false;
        unexport(&self.root, self.id)
    }
}

impl Drop for SysfsPin {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "Failed to release pin on drop");
        }
    }
}

fn export(root: &Path, id: u32) -> Result<(), HardwareError> {
    fs::write(root.join("export"), id.to_string())
        .map_err(|source| HardwareError::Export { id, source })
}

fn unexport(root: &Path, id: u32) -> Result<(), HardwareError> {
    fs::write(root.join("unexport"), id.to_string())
        .map_err(|source| HardwareError::Unexport { id, source })
}
