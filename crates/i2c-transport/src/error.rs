use thiserror::Error;

pub type Result<T, E = TransportError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("bus unavailable: {path}: {reason}")]
    BusUnavailable { path: String, reason: String },
    #[error("slave address 0x{address:02x} rejected: {reason}")]
    AddressRejected { address: u16, reason: String },
    #[error("no slave address selected")]
    NotAddressed,
    #[error("short write: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },
    #[error("short read: {read} of {expected} bytes")]
    ShortRead { read: usize, expected: usize },
    #[error("timeout waiting for device")]
    Timeout,
    #[error("I/O error: {0}")]
    Io(String),
    #[error("operation not supported on this backend: {0}")]
    Unsupported(&'static str),
}
