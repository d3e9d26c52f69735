//! Type definitions for zkattend

pub mod attendance;
pub mod device_info;
pub mod endpoint;
pub mod error;
pub mod time;

pub use attendance::{AttendanceRecord, PunchType};
pub use device_info::{DeviceInfo, DeviceInfoField};
pub use endpoint::Endpoint;
pub use error::{Error, Result};
