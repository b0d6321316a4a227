/// Resolve the character-device path for a numeric bus index.
pub fn bus_device_path(bus: u32) -> String {
    format!("/dev/i2c-{bus}")
}

#[derive(Clone, Debug)]
pub struct BusInfo {
    pub path: String,
    pub driver: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_path_follows_bus_index() {
        assert_eq!(bus_device_path(0), "/dev/i2c-0");
        assert_eq!(bus_device_path(11), "/dev/i2c-11");
    }
}
