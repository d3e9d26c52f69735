//! Client and manager configuration

use std::time::Duration;

use zkattend_core::constants::{
    CONNECT_POLL_ATTEMPTS, CONNECT_POLL_INTERVAL, CONNECT_POLL_TIMEOUT, CONNECT_SEND_ATTEMPTS,
    DEFAULT_TIMEOUT, RECOVERY_PAUSE, SLOW_DEVICE_TIMEOUT,
};

/// Retry budget for CONNECT over UDP
///
/// Each send is followed by up to `poll_attempts` reads bounded by
/// `poll_timeout`, with `poll_interval` of sleep after every empty poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectRetry {
    pub send_attempts: usize,
    pub poll_attempts: usize,
    pub poll_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ConnectRetry {
    fn default() -> Self {
        Self {
            send_attempts: CONNECT_SEND_ATTEMPTS,
            poll_attempts: CONNECT_POLL_ATTEMPTS,
            poll_timeout: CONNECT_POLL_TIMEOUT,
            poll_interval: CONNECT_POLL_INTERVAL,
        }
    }
}

/// Wire client settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Bound on every request/reply exchange
    pub timeout: Duration,

    pub connect_retry: ConnectRetry,

    /// Fill the header checksum instead of sending zero
    pub fill_checksum: bool,
}

impl ClientConfig {
    /// Set exchange timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set UDP connect retry budget
    pub fn with_connect_retry(mut self, retry: ConnectRetry) -> Self {
        self.connect_retry = retry;
        self
    }

    pub fn with_checksum(mut self, fill: bool) -> Self {
        self.fill_checksum = fill;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_retry: ConnectRetry::default(),
            fill_checksum: false,
        }
    }
}

/// Session manager settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Settings for every client the manager creates
    pub client: ClientConfig,

    /// Pause between disable and enable during fetch recovery
    pub recovery_pause: Duration,
}

impl ManagerConfig {
    pub fn with_client(mut self, client: ClientConfig) -> Self {
        self.client = client;
        self
    }

    pub fn with_recovery_pause(mut self, pause: Duration) -> Self {
        self.recovery_pause = pause;
        self
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default().with_timeout(SLOW_DEVICE_TIMEOUT),
            recovery_pause: RECOVERY_PAUSE,
        }
    }
}
