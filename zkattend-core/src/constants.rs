//! Protocol constants and client defaults

use std::time::Duration;

/// Frame prefix carried by every packet on a TCP stream
pub const TCP_MAGIC: [u8; 4] = [0x50, 0x50, 0x82, 0x7D];

/// Size of the TCP frame prefix (magic + u32 length)
pub const TCP_FRAME_PREFIX_SIZE: usize = 8;

/// Upper bound accepted for a single TCP frame
pub const MAX_TCP_FRAME_SIZE: usize = 1024 * 1024;

/// Default exchange (read) timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Exchange timeout used by the session manager for slow embedded devices
pub const SLOW_DEVICE_TIMEOUT: Duration = Duration::from_secs(15);

/// CONNECT sends before giving up on UDP
pub const CONNECT_SEND_ATTEMPTS: usize = 3;

/// Receive polls per CONNECT send on UDP
pub const CONNECT_POLL_ATTEMPTS: usize = 5;

/// Bound on a single UDP receive poll
pub const CONNECT_POLL_TIMEOUT: Duration = Duration::from_millis(500);

/// Sleep between UDP receive polls
pub const CONNECT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Pause between disable and enable in a fetch recovery cycle
pub const RECOVERY_PAUSE: Duration = Duration::from_secs(2);

/// Ticks value mixed into the CommKey
pub const COMMKEY_TICKS: u8 = 50;

/// Device option keys understood by the DEVICE (options read) command
pub mod options {
    pub const DEVICE_NAME: &str = "~DeviceName";
    pub const SERIAL_NUMBER: &str = "~SerialNumber";
    pub const PLATFORM: &str = "~Platform";
    pub const MAC_ADDRESS: &str = "MAC";
}
