//! Seams between the session manager and the wire client

use async_trait::async_trait;

use zkattend_transport::TransportMode;
use zkattend_types::{AttendanceRecord, DeviceInfoField, Endpoint};

use crate::config::ClientConfig;
use crate::device::Device;
use crate::error::Result;

/// Operations the session manager needs from a wire client
///
/// Negative protocol outcomes are `Ok(false)` / `Ok(None)`; `Err` is kept
/// for transport failures and broken transfers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttendanceClient: Send {
    fn is_connected(&self) -> bool;

    fn mode(&self) -> TransportMode;

    async fn connect(&mut self) -> Result<bool>;

    async fn disconnect(&mut self) -> Result<()>;

    async fn enable_device(&mut self) -> Result<bool>;

    async fn disable_device(&mut self) -> Result<bool>;

    async fn get_attendance(&mut self) -> Result<Option<Vec<AttendanceRecord>>>;

    async fn clear_attendance(&mut self) -> Result<bool>;

    async fn get_device_info(&mut self, field: DeviceInfoField) -> Result<Option<String>>;

    async fn authenticate(&mut self, pin: u32) -> Result<bool>;
}

/// Builds a fresh, unconnected client for one endpoint and transport
pub trait Connector: Send {
    type Client: AttendanceClient;

    fn open(&mut self, endpoint: &Endpoint, mode: TransportMode, config: &ClientConfig)
    -> Self::Client;
}

/// Connector producing real socket-backed [`Device`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct WireConnector;

impl Connector for WireConnector {
    type Client = Device;

    fn open(&mut self, endpoint: &Endpoint, mode: TransportMode, config: &ClientConfig) -> Device {
        Device::with_settings(endpoint.clone(), mode, *config)
    }
}

#[async_trait]
impl AttendanceClient for Device {
    fn is_connected(&self) -> bool {
        Device::is_connected(self)
    }

    fn mode(&self) -> TransportMode {
        Device::mode(self)
    }

    async fn connect(&mut self) -> Result<bool> {
        Device::connect(self).await
    }

    async fn disconnect(&mut self) -> Result<()> {
        Device::disconnect(self).await
    }

    async fn enable_device(&mut self) -> Result<bool> {
        Device::enable_device(self).await
    }

    async fn disable_device(&mut self) -> Result<bool> {
        Device::disable_device(self).await
    }

    async fn get_attendance(&mut self) -> Result<Option<Vec<AttendanceRecord>>> {
        Device::get_attendance(self).await
    }

    async fn clear_attendance(&mut self) -> Result<bool> {
        Device::clear_attendance(self).await
    }

    async fn get_device_info(&mut self, field: DeviceInfoField) -> Result<Option<String>> {
        Device::get_device_info(self, field).await
    }

    async fn authenticate(&mut self, pin: u32) -> Result<bool> {
        Device::authenticate(self, pin).await
    }
}
