use i2c_transport::TransportError;
use thiserror::Error;

pub type Result<T, E = DeviceError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("unknown device type: {0}")]
    UnknownType(String),
    #[error("invalid bus number: {0}")]
    InvalidBus(String),
    #[error("invalid slave address: {0}")]
    InvalidAddress(String),
    #[error("invalid channel {channel} (device has {channels})")]
    InvalidChannel { channel: u8, channels: u8 },
    #[error("device not initialised")]
    NotInitialized,
    #[error(transparent)]
    Transport(#[from] TransportError),
}
