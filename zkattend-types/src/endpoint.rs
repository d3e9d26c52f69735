//! Device address

use std::fmt;

/// Default ZKTeco device port
pub const DEFAULT_PORT: u16 = 4370;

/// Network location of a terminal
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub ip: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self { ip: ip.into(), port }
    }

    /// Endpoint on the default port 4370
    pub fn with_default_port(ip: impl Into<String>) -> Self {
        Self::new(ip, DEFAULT_PORT)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}
