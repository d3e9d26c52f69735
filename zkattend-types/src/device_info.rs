//! Device information structures

use std::fmt;

/// Placeholder for fields the device did not report
pub const NOT_AVAILABLE: &str = "N/A";

/// Descriptive fields that can be queried one at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceInfoField {
    DeviceName,
    SerialNumber,
    Platform,
    FirmwareVersion,
    MacAddress,
}

impl DeviceInfoField {
    /// All fields in summary order
    pub const ALL: [DeviceInfoField; 5] = [
        Self::DeviceName,
        Self::SerialNumber,
        Self::Platform,
        Self::FirmwareVersion,
        Self::MacAddress,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::DeviceName => "device_name",
            Self::SerialNumber => "serial_number",
            Self::Platform => "platform",
            Self::FirmwareVersion => "firmware_version",
            Self::MacAddress => "mac_address",
        }
    }
}

impl fmt::Display for DeviceInfoField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Device information summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Device name (user-assigned)
    pub device_name: String,

    /// Device serial number
    pub serial_number: String,

    /// Platform name
    pub platform: String,

    /// Firmware version
    pub firmware_version: String,

    /// MAC address
    pub mac_address: String,
}

impl DeviceInfo {
    /// Summary with every field set to `N/A`
    pub fn unavailable() -> Self {
        Self {
            device_name: NOT_AVAILABLE.into(),
            serial_number: NOT_AVAILABLE.into(),
            platform: NOT_AVAILABLE.into(),
            firmware_version: NOT_AVAILABLE.into(),
            mac_address: NOT_AVAILABLE.into(),
        }
    }

    /// Store `value` for `field`, falling back to `N/A` when absent
    pub fn set(&mut self, field: DeviceInfoField, value: Option<String>) {
        let value = value.unwrap_or_else(|| NOT_AVAILABLE.into());
        match field {
            DeviceInfoField::DeviceName => self.device_name = value,
            DeviceInfoField::SerialNumber => self.serial_number = value,
            DeviceInfoField::Platform => self.platform = value,
            DeviceInfoField::FirmwareVersion => self.firmware_version = value,
            DeviceInfoField::MacAddress => self.mac_address = value,
        }
    }

    pub fn get(&self, field: DeviceInfoField) -> &str {
        match field {
            DeviceInfoField::DeviceName => &self.device_name,
            DeviceInfoField::SerialNumber => &self.serial_number,
            DeviceInfoField::Platform => &self.platform,
            DeviceInfoField::FirmwareVersion => &self.firmware_version,
            DeviceInfoField::MacAddress => &self.mac_address,
        }
    }

    /// Flat `(key, value)` pairs for display
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        DeviceInfoField::ALL
            .iter()
            .map(|&field| (field.name(), self.get(field)))
            .collect()
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Device[{} SN: {}, FW: {}, MAC: {}]",
            self.device_name, self.serial_number, self.firmware_version, self.mac_address
        )
    }
}
