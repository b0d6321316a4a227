use crate::{BusInfo, Result};

/// A minimal blocking I2C master interface.
///
/// Every backend follows the same register protocol: open the bus, select a
/// slave address, then issue raw writes and reads against that slave. A
/// handle talks to one slave at a time; callers that share a physical bus
/// between devices must serialize access externally.
pub trait I2cBus {
    /// Open a bus by numeric index (e.g., 1 for `/dev/i2c-1`).
    fn open(bus: u32) -> Result<Self>
    where
        Self: Sized;

    /// Attempt to list available buses for this backend.
    fn list() -> Result<Vec<BusInfo>>;

    /// Latch the slave address for subsequent transfers. Re-selecting the
    /// current address is a no-op.
    fn select_slave(&mut self, address: u16) -> Result<()>;

    /// Write raw bytes to the selected slave. A partial transfer surfaces as
    /// `ShortWrite`.
    fn write(&mut self, bytes: &[u8]) -> Result<usize>;

    /// Read raw bytes from the selected slave into `buf`. Blocking; a partial
    /// transfer surfaces as `ShortRead`.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
}
