//! Datagram transport
//!
//! One datagram carries exactly one bare packet, no framing. This is the
//! transport terminals answer first on port 4370.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, trace};

use zkattend_core::MAX_PACKET_SIZE;

use crate::{error::*, preview, resolve, Transport, TransportMode};

/// Connected UDP socket to one terminal
pub struct UdpTransport {
    addr: String,
    port: u16,
    socket: Option<UdpSocket>,
    remote_addr: Option<SocketAddr>,
}

impl UdpTransport {
    pub fn new(addr: impl Into<String>, port: u16) -> Self {
        Self {
            addr: addr.into(),
            port,
            socket: None,
            remote_addr: None,
        }
    }

    async fn resolve_addr(&mut self) -> Result<SocketAddr> {
        if let Some(addr) = self.remote_addr {
            return Ok(addr);
        }

        let addr = resolve(&self.addr, self.port).await?;
        self.remote_addr = Some(addr);
        Ok(addr)
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        let remote = self.resolve_addr().await?;

        // Ephemeral local port, same family as the peer
        let local = if remote.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(remote).await?;

        debug!(%remote, local = ?socket.local_addr().ok(), "UDP socket open");
        self.socket = Some(socket);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if self.socket.take().is_some() {
            debug!(remote = %self.remote_addr(), "UDP socket closed");
        }

        self.remote_addr = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    async fn send(&mut self, packet: &[u8]) -> Result<()> {
        let socket = self.socket.as_ref().ok_or(Error::NotConnected)?;

        trace!(len = packet.len(), data = %preview(packet), "UDP send");
        socket.send(packet).await?;
        Ok(())
    }

    async fn receive(&mut self, wait: Duration) -> Result<BytesMut> {
        let socket = self.socket.as_ref().ok_or(Error::NotConnected)?;

        let mut buf = BytesMut::zeroed(MAX_PACKET_SIZE);

        let Ok(received) = timeout(wait, socket.recv(&mut buf)).await else {
            trace!(?wait, "UDP receive timed out");
            return Err(Error::ReadTimeout);
        };

        let n = received?;
        if n == 0 {
            return Err(Error::ConnectionClosed);
        }
        buf.truncate(n);

        trace!(len = n, data = %preview(&buf), "UDP receive");
        Ok(buf)
    }

    fn mode(&self) -> TransportMode {
        TransportMode::Udp
    }

    fn remote_addr(&self) -> String {
        self.remote_addr
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| format!("{}:{}", self.addr, self.port))
    }
}
