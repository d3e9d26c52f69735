//! # zkattend
//!
//! Client for ZKTeco-style attendance terminals.
//!
//! ## Features
//!
//! - UDP and TCP transports with the device's binary framing
//! - Session manager with UDP-to-TCP fallback and one-shot recovery
//! - Attendance log download and decoding
//! - Device information queries
//!
//! ## Quick Start
//!
//! ```no_run
//! use zkattend::{DeviceManager, Endpoint};
//!
//! #[tokio::main]
//! async fn main() -> zkattend::Result<()> {
//!     let mut manager = DeviceManager::new(Endpoint::with_default_port("192.168.1.201"));
//!
//!     let info = manager.get_device_info().await?;
//!     println!("{}", info);
//!
//!     for record in manager.get_attendance().await? {
//!         println!("{}", record);
//!     }
//!
//!     manager.disconnect().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod device;
pub mod error;
pub mod manager;

// Re-exports
pub use client::{AttendanceClient, Connector, WireConnector};
pub use config::{ClientConfig, ConnectRetry, ManagerConfig};
pub use device::{decode_attendance, Device};
pub use error::{Error, Result};
pub use manager::{Credentials, DeviceManager};

// Re-export types
pub use zkattend_core::{Command, Packet, Session, SessionState};
pub use zkattend_transport::TransportMode;
pub use zkattend_types::{AttendanceRecord, DeviceInfo, DeviceInfoField, Endpoint, PunchType};
