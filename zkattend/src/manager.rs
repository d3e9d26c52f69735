//! Connection lifecycle policy around the wire client
//!
//! [`DeviceManager`] owns at most one client at a time. It connects over
//! UDP first and falls back to TCP, brackets attendance downloads with
//! enable/disable, and runs one recovery cycle when a download comes back
//! empty. Management-command failures are logged rather than raised; only
//! "no connection at all" and "fetch failed after recovery" are errors.

use tracing::{debug, error, info, warn};

use zkattend_transport::TransportMode;
use zkattend_types::{AttendanceRecord, DeviceInfo, DeviceInfoField, Endpoint};

use crate::client::{AttendanceClient, Connector, WireConnector};
use crate::config::ManagerConfig;
use crate::error::{Error, Result};

/// Transports tried by [`DeviceManager::connect`], in order
const FALLBACK_ORDER: [TransportMode; 2] = [TransportMode::Udp, TransportMode::Tcp];

/// Optional device credentials supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Expected serial number; a mismatch is logged
    pub serial_number: Option<String>,

    /// CommKey password answered after connect
    pub device_pin: Option<u32>,
}

/// Session manager for one terminal
///
/// # Examples
///
/// ```no_run
/// use zkattend::{DeviceManager, Endpoint};
///
/// #[tokio::main]
/// async fn main() -> zkattend::Result<()> {
///     let mut manager = DeviceManager::new(Endpoint::with_default_port("192.168.1.201"));
///
///     let records = manager.get_attendance().await;
///     manager.disconnect().await;
///
///     for record in records? {
///         println!("{}", record);
///     }
///     Ok(())
/// }
/// ```
pub struct DeviceManager<C: Connector = WireConnector> {
    endpoint: Endpoint,
    credentials: Option<Credentials>,
    config: ManagerConfig,
    connector: C,
    client: Option<C::Client>,
}

impl DeviceManager<WireConnector> {
    /// Manager over real UDP/TCP sockets
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_connector(endpoint, WireConnector)
    }
}

impl<C: Connector> DeviceManager<C> {
    pub fn with_connector(endpoint: Endpoint, connector: C) -> Self {
        Self {
            endpoint,
            credentials: None,
            config: ManagerConfig::default(),
            connector,
            client: None,
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn is_connected(&self) -> bool {
        self.client.as_ref().is_some_and(|client| client.is_connected())
    }

    /// Transport of the live client, if any
    pub fn active_mode(&self) -> Option<TransportMode> {
        self.client.as_ref().map(|client| client.mode())
    }

    /// Connect over UDP, falling back to TCP
    ///
    /// Every attempt uses a brand-new client. Returns false only when both
    /// transports fail.
    pub async fn connect(&mut self) -> bool {
        self.disconnect().await;

        for mode in FALLBACK_ORDER {
            info!(endpoint = %self.endpoint, %mode, "Connecting to device");

            let mut client = self.connector.open(&self.endpoint, mode, &self.config.client);

            match client.connect().await {
                Ok(true) => {
                    info!(endpoint = %self.endpoint, %mode, "Device connected");
                    prepare_session(&mut client, &self.endpoint, self.credentials.as_ref()).await;
                    self.client = Some(client);
                    return true;
                }
                Ok(false) => warn!(endpoint = %self.endpoint, %mode, "Device did not answer"),
                Err(e) => warn!(endpoint = %self.endpoint, %mode, error = %e, "Connect failed"),
            }
        }

        error!(endpoint = %self.endpoint, "Could not connect over UDP or TCP");
        false
    }

    /// Drop the current client and connect with fresh ones
    pub async fn reconnect(&mut self) -> bool {
        info!(endpoint = %self.endpoint, "Reconnecting");
        self.disconnect().await;
        self.connect().await
    }

    /// Connect and immediately disconnect
    pub async fn test_connection(&mut self) -> bool {
        let reachable = self.connect().await;
        self.disconnect().await;
        reachable
    }

    /// Download the attendance log
    ///
    /// An empty log counts as a failed fetch. One recovery cycle (disable, pause, enable) precedes a single retry.
    /// The device is disabled once more on every exit path after
    /// connecting. The connection is left open.
    pub async fn get_attendance(&mut self) -> Result<Vec<AttendanceRecord>> {
        self.ensure_connected().await?;

        let outcome = self.fetch_with_recovery().await;
        self.disable_after_fetch().await;

        match &outcome {
            Ok(records) => info!(
                endpoint = %self.endpoint,
                records = records.len(),
                "Attendance fetch complete"
            ),
            Err(e) => error!(endpoint = %self.endpoint, error = %e, "Attendance fetch failed"),
        }

        outcome
    }

    async fn fetch_with_recovery(&mut self) -> Result<Vec<AttendanceRecord>> {
        let endpoint = self.endpoint.clone();
        let pause = self.config.recovery_pause;
        let client = self.client()?;

        match client.get_attendance().await {
            Ok(Some(records)) if !records.is_empty() => return Ok(records),
            Ok(_) => warn!(%endpoint, "No attendance data, starting recovery cycle"),
            Err(e) => warn!(%endpoint, error = %e, "Attendance fetch failed, starting recovery cycle"),
        }

        log_step(&endpoint, "recovery disable", client.disable_device().await);
        tokio::time::sleep(pause).await;
        log_step(&endpoint, "recovery enable", client.enable_device().await);

        match client.get_attendance().await {
            Ok(Some(records)) if !records.is_empty() => {
                info!(%endpoint, records = records.len(), "Fetch succeeded after recovery");
                Ok(records)
            }
            Ok(_) => Err(Error::FetchFailed {
                endpoint,
                reason: "device returned no attendance data".into(),
            }),
            Err(e) => Err(Error::FetchFailed {
                endpoint,
                reason: e.to_string(),
            }),
        }
    }

    /// Final disable of the fetch bracket; never fails the caller
    async fn disable_after_fetch(&mut self) {
        let Some(client) = self.client.as_mut() else {
            return;
        };

        match client.disable_device().await {
            Ok(true) => debug!(endpoint = %self.endpoint, "Device disabled after fetch"),
            Ok(false) => warn!(endpoint = %self.endpoint, "Device did not acknowledge disable after fetch"),
            Err(e) => warn!(endpoint = %self.endpoint, error = %e, "Cleanup disable failed"),
        }
    }

    /// Query every descriptive field, `N/A` for the ones that fail
    pub async fn get_device_info(&mut self) -> Result<DeviceInfo> {
        self.ensure_connected().await?;
        let client = self.client()?;

        let mut info = DeviceInfo::unavailable();
        for field in DeviceInfoField::ALL {
            let value = match client.get_device_info(field).await {
                Ok(value) => value,
                Err(e) => {
                    warn!(%field, error = %e, "Device info query failed");
                    None
                }
            };
            info.set(field, value);
        }

        Ok(info)
    }

    pub async fn enable_device(&mut self) -> Result<bool> {
        self.ensure_connected().await?;
        self.client()?.enable_device().await
    }

    pub async fn disable_device(&mut self) -> Result<bool> {
        self.ensure_connected().await?;
        self.client()?.disable_device().await
    }

    pub async fn clear_attendance(&mut self) -> Result<bool> {
        self.ensure_connected().await?;
        self.client()?.clear_attendance().await
    }

    /// Close the active client; failures are only logged
    pub async fn disconnect(&mut self) {
        let Some(mut client) = self.client.take() else {
            return;
        };

        match client.disconnect().await {
            Ok(()) => info!(endpoint = %self.endpoint, "Disconnected"),
            Err(e) => warn!(endpoint = %self.endpoint, error = %e, "Disconnect failed"),
        }
    }

    async fn ensure_connected(&mut self) -> Result<()> {
        if self.is_connected() || self.connect().await {
            return Ok(());
        }

        Err(Error::ConnectFailed {
            endpoint: self.endpoint.clone(),
        })
    }

    fn client(&mut self) -> Result<&mut C::Client> {
        self.client.as_mut().ok_or(Error::NotConnected)
    }
}

/// Credential hooks and enable after connect; all best-effort
async fn prepare_session<T: AttendanceClient>(
    client: &mut T,
    endpoint: &Endpoint,
    credentials: Option<&Credentials>,
) {
    if let Some(credentials) = credentials {
        if let Some(pin) = credentials.device_pin {
            match client.authenticate(pin).await {
                Ok(true) => debug!(%endpoint, "Device PIN accepted"),
                Ok(false) => warn!(%endpoint, "Device PIN not accepted"),
                Err(e) => warn!(%endpoint, error = %e, "Device PIN setup failed"),
            }
        }

        if let Some(expected) = &credentials.serial_number {
            match client.get_device_info(DeviceInfoField::SerialNumber).await {
                Ok(Some(actual)) if actual == *expected => debug!(%endpoint, "Serial number verified"),
                Ok(Some(actual)) => warn!(%endpoint, %expected, %actual, "Serial number mismatch"),
                Ok(None) => warn!(%endpoint, "Serial number unavailable"),
                Err(e) => warn!(%endpoint, error = %e, "Serial number check failed"),
            }
        }
    }

    log_step(endpoint, "enable after connect", client.enable_device().await);
}

fn log_step(endpoint: &Endpoint, step: &str, result: Result<bool>) {
    match result {
        Ok(true) => debug!(%endpoint, step, "Acknowledged"),
        Ok(false) => warn!(%endpoint, step, "Not acknowledged"),
        Err(e) => warn!(%endpoint, step, error = %e, "Failed"),
    }
}
