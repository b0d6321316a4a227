//! adc-drivers: I2C analog-to-digital converter devices
//!
//! A closed set of supported ADC chips, a name-keyed factory for creating
//! them from operator input, and the register protocol for reading one
//! calibrated value per channel (select channel, poll for conversion, read,
//! scale).

mod chips;
pub use chips::{available_types, AdcChip};

mod error;
pub use error::{DeviceError, Result};

mod device;
pub use device::{parse_address, AdcDevice};
