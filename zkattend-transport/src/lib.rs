//! Transport layer for ZKTeco protocol
//!
//! Provides TCP/UDP communication with devices. Both transports move whole
//! protocol packets: UDP sends them as bare datagrams, TCP wraps each one in
//! an 8-byte frame prefix.

pub mod tcp;
pub mod udp;
pub mod error;

pub use error::{Error, Result};
pub use tcp::TcpTransport;
pub use udp::UdpTransport;

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;

/// Wire transport selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportMode {
    Udp,
    Tcp,
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Udp => f.write_str("udp"),
            Self::Tcp => f.write_str("tcp"),
        }
    }
}

/// Transport trait for different communication methods
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the socket
    async fn connect(&mut self) -> Result<()>;

    /// Close the socket
    async fn disconnect(&mut self) -> Result<()>;

    /// Check if the socket is open
    fn is_connected(&self) -> bool;

    /// Send one encoded packet
    async fn send(&mut self, packet: &[u8]) -> Result<()>;

    /// Receive one encoded packet, waiting at most `timeout`
    async fn receive(&mut self, timeout: Duration) -> Result<BytesMut>;

    /// Which transport this is
    fn mode(&self) -> TransportMode;

    /// Get remote address
    fn remote_addr(&self) -> String;
}

/// Resolve `host:port` to the first socket address
pub(crate) async fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    let addr_str = format!("{}:{}", host, port);

    let mut addrs = tokio::net::lookup_host(&addr_str)
        .await
        .map_err(|e| Error::InvalidAddress(format!("{}: {}", addr_str, e)))?;

    addrs
        .next()
        .ok_or_else(|| Error::InvalidAddress(format!("No addresses found for {}", addr_str)))
}

/// Hex preview of the first bytes of a buffer for trace logs
pub(crate) fn preview(data: &[u8]) -> String {
    hex::encode(&data[..data.len().min(32)])
}
