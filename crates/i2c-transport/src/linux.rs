use crate::{bus_device_path, BusInfo, I2cBus, Result, TransportError};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::unix::io::AsRawFd;
use tracing::{debug, warn};

// /dev/i2c-N ioctl commands (linux/i2c-dev.h).
const I2C_RETRIES: libc::c_ulong = 0x0701;
const I2C_TIMEOUT: libc::c_ulong = 0x0702;
const I2C_SLAVE: libc::c_ulong = 0x0703;

// Adapter-side transfer bounds: address polls, and timeout in 10 ms units.
// A non-responding slave fails the transfer instead of wedging the caller.
const ADAPTER_RETRIES: libc::c_ulong = 3;
const ADAPTER_TIMEOUT_10MS: libc::c_ulong = 5;

/// I2C master backed by a Linux i2c-dev character device.
pub struct LinuxI2c {
    path: String,
    file: File,
    current_addr: Option<u16>,
}

impl I2cBus for LinuxI2c {
    fn open(bus: u32) -> Result<Self> {
        let path = bus_device_path(bus);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| TransportError::BusUnavailable {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        // Best-effort bounds; adapters that reject these keep their defaults.
        unsafe {
            libc::ioctl(file.as_raw_fd(), I2C_RETRIES, ADAPTER_RETRIES);
            libc::ioctl(file.as_raw_fd(), I2C_TIMEOUT, ADAPTER_TIMEOUT_10MS);
        }
        debug!(%path, "opened i2c bus");
        Ok(Self {
            path,
            file,
            current_addr: None,
        })
    }

    fn list() -> Result<Vec<BusInfo>> {
        let entries = std::fs::read_dir("/dev").map_err(|e| TransportError::Io(e.to_string()))?;
        let mut out = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with("i2c-") {
                out.push(BusInfo {
                    path: format!("/dev/{name}"),
                    driver: "i2c-dev".to_string(),
                });
            }
        }
        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }

    fn select_slave(&mut self, address: u16) -> Result<()> {
        if self.current_addr == Some(address) {
            return Ok(());
        }
        let ret = unsafe {
            libc::ioctl(self.file.as_raw_fd(), I2C_SLAVE, libc::c_ulong::from(address))
        };
        if ret < 0 {
            return Err(TransportError::AddressRejected {
                address,
                reason: std::io::Error::last_os_error().to_string(),
            });
        }
        debug!(address, path = %self.path, "selected i2c slave");
        self.current_addr = Some(address);
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        if self.current_addr.is_none() {
            return Err(TransportError::NotAddressed);
        }
        let written = self
            .file
            .write(bytes)
            .map_err(|e| TransportError::Io(e.to_string()))?;
        if written != bytes.len() {
            warn!(written, expected = bytes.len(), path = %self.path, "short i2c write");
            return Err(TransportError::ShortWrite {
                written,
                expected: bytes.len(),
            });
        }
        Ok(written)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.current_addr.is_none() {
            return Err(TransportError::NotAddressed);
        }
        let read = self
            .file
            .read(buf)
            .map_err(|e| TransportError::Io(e.to_string()))?;
        if read != buf.len() {
            warn!(read, expected = buf.len(), path = %self.path, "short i2c read");
            return Err(TransportError::ShortRead {
                read,
                expected: buf.len(),
            });
        }
        Ok(read)
    }
}
