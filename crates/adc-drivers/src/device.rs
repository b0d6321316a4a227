use crate::chips::AdcChip;
use crate::error::{DeviceError, Result};
use i2c_transport::{I2cBus, TransportError};
use std::thread;
use tracing::{debug, warn};

// ADS1x15 register map.
const REG_CONVERSION: u8 = 0x00;
const REG_CONFIG: u8 = 0x01;

// Config register fields (16-bit, big-endian on the wire).
// OS reads back 1 once a single-shot conversion has landed.
const CONFIG_OS_SINGLE: u16 = 0x8000;
const CONFIG_MUX_SINGLE_0: u16 = 0x4000;
const CONFIG_PGA_4_096V: u16 = 0x0200;
const CONFIG_MODE_SINGLE: u16 = 0x0100;
const CONFIG_DR_DEFAULT: u16 = 0x0080;
const CONFIG_COMP_DISABLE: u16 = 0x0003;

// Poll budget for the OS bit before giving up on a conversion.
const CONVERSION_POLL_ATTEMPTS: u32 = 10;

/// One physical ADC reachable over a shared bus.
///
/// The bus handle is owned exclusively; register transactions on one device
/// are serialized by construction. Devices on distinct buses may be read in
/// parallel.
pub struct AdcDevice<B: I2cBus> {
    bus_number: u32,
    address: u16,
    chip: AdcChip,
    bus: Option<B>,
}

impl<B: I2cBus> AdcDevice<B> {
    /// Build a device from operator-supplied strings. The address accepts a
    /// `0x`-prefixed hex literal or plain decimal; the device type must match
    /// a registry name exactly. Nothing is created on failure.
    pub fn create(bus: &str, address: &str, device_type: &str) -> Result<Self> {
        let chip = AdcChip::from_name(device_type)
            .ok_or_else(|| DeviceError::UnknownType(device_type.to_string()))?;
        let bus_number = bus
            .trim()
            .parse::<u32>()
            .map_err(|_| DeviceError::InvalidBus(bus.to_string()))?;
        let address = parse_address(address)?;
        Ok(Self {
            bus_number,
            address,
            chip,
            bus: None,
        })
    }

    /// Open the transport and latch the slave address. Fatal for this device
    /// on failure; the caller decides whether to retry.
    pub fn init(&mut self) -> Result<()> {
        let mut bus = B::open(self.bus_number)?;
        bus.select_slave(self.address)?;
        debug!(
            bus = self.bus_number,
            address = self.address,
            chip = self.chip.name(),
            "adc initialised"
        );
        self.bus = Some(bus);
        Ok(())
    }

    /// Attach an already-open handle instead of opening one. Used by tests
    /// and by callers that configure the transport themselves.
    pub fn with_bus(mut bus: B, bus_number: u32, address: u16, chip: AdcChip) -> Result<Self> {
        bus.select_slave(address)?;
        Ok(Self {
            bus_number,
            address,
            chip,
            bus: Some(bus),
        })
    }

    /// Read one calibrated value. Every call performs a fresh conversion:
    /// write the config register (channel MUX + single-shot start), poll the
    /// OS bit with a bounded budget, then fetch and scale the sample.
    pub fn read_value(&mut self, channel: u8) -> Result<f32> {
        let chip = self.chip;
        if channel >= chip.channel_count() {
            return Err(DeviceError::InvalidChannel {
                channel,
                channels: chip.channel_count(),
            });
        }
        let bus = self.bus.as_mut().ok_or(DeviceError::NotInitialized)?;

        let config = CONFIG_OS_SINGLE
            | (CONFIG_MUX_SINGLE_0 + (u16::from(channel) << 12))
            | CONFIG_PGA_4_096V
            | CONFIG_MODE_SINGLE
            | CONFIG_DR_DEFAULT
            | CONFIG_COMP_DISABLE;
        let [hi, lo] = config.to_be_bytes();
        bus.write(&[REG_CONFIG, hi, lo])?;

        let mut ready = false;
        for _ in 0..CONVERSION_POLL_ATTEMPTS {
            thread::sleep(chip.conversion_delay());
            let mut scratch = [0u8; 2];
            bus.read(&mut scratch)?;
            if u16::from_be_bytes(scratch) & CONFIG_OS_SINGLE != 0 {
                ready = true;
                break;
            }
        }
        if !ready {
            warn!(
                address = self.address,
                channel, "conversion never completed"
            );
            return Err(DeviceError::Transport(TransportError::Timeout));
        }

        bus.write(&[REG_CONVERSION])?;
        let mut raw = [0u8; 2];
        bus.read(&mut raw)?;
        let code = i16::from_be_bytes(raw) >> chip.sample_shift();
        Ok(f32::from(code) * chip.lsb_volts())
    }

    pub fn bus_number(&self) -> u32 {
        self.bus_number
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn device_type(&self) -> &'static str {
        self.chip.name()
    }

    pub fn channel_count(&self) -> u8 {
        self.chip.channel_count()
    }

    pub fn is_initialised(&self) -> bool {
        self.bus.is_some()
    }
}

/// Parse a 7-bit slave address from a `0x`-prefixed hex or decimal literal.
pub fn parse_address(spec: &str) -> Result<u16> {
    let t = spec.trim();
    let parsed = if let Some(hex) = t.strip_prefix("0x") {
        u16::from_str_radix(hex, 16).ok()
    } else {
        t.parse::<u16>().ok()
    };
    parsed
        .filter(|a| *a <= 0x7F)
        .ok_or_else(|| DeviceError::InvalidAddress(spec.to_string()))
}
