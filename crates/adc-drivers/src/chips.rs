use std::time::Duration;

/// Supported ADC device types.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum AdcChip {
    /// Texas Instruments ADS1015 (12-bit, up to 3300 SPS)
    Ads1015,
    /// Texas Instruments ADS1115 (16-bit, up to 860 SPS)
    Ads1115,
}

/// Fixed registry of device-type names, in factory dispatch order.
pub fn available_types() -> &'static [&'static str] {
    &["ADS1015", "ADS1115"]
}

impl AdcChip {
    /// Exact-name lookup against the registry.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ADS1015" => Some(Self::Ads1015),
            "ADS1115" => Some(Self::Ads1115),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Ads1015 => "ADS1015",
            Self::Ads1115 => "ADS1115",
        }
    }

    /// Independently addressable single-ended inputs.
    pub fn channel_count(self) -> u8 {
        4
    }

    /// Right shift aligning the conversion register to the sample width.
    pub fn sample_shift(self) -> u8 {
        match self {
            Self::Ads1015 => 4,
            Self::Ads1115 => 0,
        }
    }

    /// Volts per LSB at the ±4.096 V full-scale range.
    pub fn lsb_volts(self) -> f32 {
        match self {
            Self::Ads1015 => 0.002,
            Self::Ads1115 => 0.000_125,
        }
    }

    /// Worst-case single-shot conversion time at the default data rate.
    pub fn conversion_delay(self) -> Duration {
        match self {
            Self::Ads1015 => Duration::from_millis(1),
            Self::Ads1115 => Duration::from_millis(8),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_names_round_trip() {
        for name in available_types() {
            let chip = match AdcChip::from_name(name) {
                Some(c) => c,
                None => panic!("registry name {name} did not resolve"),
            };
            assert_eq!(chip.name(), *name);
        }
    }

    #[test]
    fn lookup_is_exact_match() {
        assert!(AdcChip::from_name("ads1015").is_none());
        assert!(AdcChip::from_name("ADS1015 ").is_none());
        assert!(AdcChip::from_name("INA219").is_none());
    }
}
