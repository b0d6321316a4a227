//! i2c-transport: register-level access to two-wire buses
//!
//! This crate provides traits and types for addressing and reading slave
//! devices on an I2C bus, with feature-gated backends. The default build
//! enables a `mock` backend so that binaries can compile and test on any host
//! without `/dev/i2c-*` nodes.

mod types;
pub use types::{bus_device_path, BusInfo};

mod error;
pub use error::{Result, TransportError};

mod traits;
pub use traits::I2cBus;

#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "mock")]
pub use mock::MockBus;

#[cfg(feature = "linux-i2c")]
mod linux;

#[cfg(feature = "linux-i2c")]
pub use linux::LinuxI2c;
