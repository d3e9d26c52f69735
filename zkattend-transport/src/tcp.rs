//! TCP transport
//!
//! On a stream every packet is preceded by an 8-byte frame prefix:
//!
//! ```text
//! ┌──────────────────┬──────────────────┬──────────────────┐
//! │ 50 50 82 7D      │ Length (LE u32)  │ Packet           │
//! │ 4 bytes          │ 4 bytes          │ Length bytes     │
//! └──────────────────┴──────────────────┴──────────────────┘
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Buf, BufMut, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use zkattend_core::constants::{
    DEFAULT_TIMEOUT, MAX_TCP_FRAME_SIZE, TCP_FRAME_PREFIX_SIZE, TCP_MAGIC,
};
use zkattend_core::HEADER_SIZE;

use crate::{error::*, preview, resolve, Transport, TransportMode};

/// Framed TCP stream to one terminal
pub struct TcpTransport {
    addr: String,
    port: u16,
    socket_addr: Option<SocketAddr>,
    stream: Option<TcpStream>,
    connect_timeout: Duration,
}

impl TcpTransport {
    pub fn new(addr: impl Into<String>, port: u16) -> Self {
        Self {
            addr: addr.into(),
            port,
            socket_addr: None,
            stream: None,
            connect_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Bound on the TCP handshake
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Resolve address to SocketAddr
    async fn resolve_addr(&mut self) -> Result<SocketAddr> {
        if let Some(addr) = self.socket_addr {
            return Ok(addr);
        }

        let addr = resolve(&self.addr, self.port).await?;
        self.socket_addr = Some(addr);
        Ok(addr)
    }
}

/// Wrap an encoded packet in the TCP frame prefix
pub fn frame(packet: &[u8]) -> BytesMut {
    let mut buf = BytesMut::with_capacity(TCP_FRAME_PREFIX_SIZE + packet.len());
    buf.put_slice(&TCP_MAGIC);
    buf.put_u32_le(packet.len() as u32);
    buf.put_slice(packet);
    buf
}

/// Validate a frame prefix and return the packet length it announces
pub fn parse_frame_prefix(prefix: &[u8; TCP_FRAME_PREFIX_SIZE]) -> Result<usize> {
    if prefix[..4] != TCP_MAGIC {
        return Err(Error::InvalidFrame(format!(
            "bad magic {}",
            hex::encode(&prefix[..4])
        )));
    }

    let mut len_bytes = &prefix[4..];
    let len = len_bytes.get_u32_le() as usize;

    if len < HEADER_SIZE || len > MAX_TCP_FRAME_SIZE {
        return Err(Error::InvalidFrame(format!("bad length {}", len)));
    }

    Ok(len)
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        let addr = self.resolve_addr().await?;

        let Ok(connected) = timeout(self.connect_timeout, TcpStream::connect(addr)).await else {
            debug!(%addr, timeout = ?self.connect_timeout, "TCP connect timed out");
            return Err(Error::ConnectionTimeout);
        };

        let stream = connected?;
        // Request/reply traffic, one small frame at a time
        stream.set_nodelay(true)?;

        debug!(%addr, "TCP stream open");

        self.stream = Some(stream);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                trace!(error = %e, "TCP shutdown failed");
            }
            debug!(remote = %self.remote_addr(), "TCP stream closed");
        }

        self.socket_addr = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn send(&mut self, packet: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        let data = frame(packet);
        trace!(len = data.len(), data = %preview(&data), "TCP send");

        stream.write_all(&data).await?;
        stream.flush().await?;

        Ok(())
    }

    async fn receive(&mut self, wait: Duration) -> Result<BytesMut> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        // Deadline covers prefix and body
        let read_frame = async {
            let mut prefix = [0u8; TCP_FRAME_PREFIX_SIZE];
            stream.read_exact(&mut prefix).await?;

            let len = parse_frame_prefix(&prefix)?;

            let mut buf = BytesMut::zeroed(len);
            stream.read_exact(&mut buf).await?;
            Ok::<_, Error>(buf)
        };

        let buf = match timeout(wait, read_frame).await {
            Err(_) => return Err(Error::ReadTimeout),
            Ok(Err(Error::Io(e))) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(Error::ConnectionClosed);
            }
            Ok(result) => result?,
        };

        trace!(len = buf.len(), data = %preview(&buf), "TCP receive");
        Ok(buf)
    }

    fn mode(&self) -> TransportMode {
        TransportMode::Tcp
    }

    fn remote_addr(&self) -> String {
        self.socket_addr
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| format!("{}:{}", self.addr, self.port))
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        if self.is_connected() {
            warn!("TCP transport dropped while still connected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_tcp_transport_create() {
        let transport = TcpTransport::new("192.168.1.201", 4370);
        assert!(!transport.is_connected());
        assert_eq!(transport.mode(), TransportMode::Tcp);
    }

    #[tokio::test]
    async fn test_tcp_transport_invalid_address() {
        let mut transport = TcpTransport::new("invalid..address", 4370)
            .with_connect_timeout(Duration::from_millis(100));

        let result = transport.connect().await;
        assert!(result.is_err());
    }

    #[test]
    fn test_frame_layout() {
        let framed = frame(&[0xE8, 0x03, 0, 0, 0, 0, 0xFE, 0xFF]);

        assert_eq!(&framed[..4], &TCP_MAGIC);
        assert_eq!(&framed[4..8], &[8, 0, 0, 0]);
        assert_eq!(framed.len(), 16);
    }

    #[test]
    fn test_frame_prefix_rejects_bad_magic() {
        let prefix = [0x51, 0x50, 0x82, 0x7D, 8, 0, 0, 0];
        assert!(matches!(parse_frame_prefix(&prefix), Err(Error::InvalidFrame(_))));
    }

    #[test]
    fn test_frame_prefix_rejects_short_length() {
        let prefix = [0x50, 0x50, 0x82, 0x7D, 4, 0, 0, 0];
        assert!(matches!(parse_frame_prefix(&prefix), Err(Error::InvalidFrame(_))));
    }

    #[tokio::test]
    async fn test_tcp_framed_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut prefix = [0u8; TCP_FRAME_PREFIX_SIZE];
            socket.read_exact(&mut prefix).await.unwrap();
            let len = parse_frame_prefix(&prefix).unwrap();
            let mut packet = vec![0u8; len];
            socket.read_exact(&mut packet).await.unwrap();

            socket.write_all(&frame(&packet)).await.unwrap();
            packet
        });

        let mut transport = TcpTransport::new("127.0.0.1", port);
        transport.connect().await.unwrap();

        let packet = [0xE8, 0x03, 0, 0, 0, 0, 0xFE, 0xFF, 1, 2];
        transport.send(&packet).await.unwrap();

        let echoed = transport.receive(Duration::from_secs(2)).await.unwrap();
        assert_eq!(&echoed[..], &packet);
        assert_eq!(server.await.unwrap(), packet.to_vec());

        // Server hung up after echoing
        let result = transport.receive(Duration::from_secs(2)).await;
        assert!(matches!(result, Err(Error::ConnectionClosed)));

        transport.disconnect().await.unwrap();
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_tcp_connect_refused() {
        // Bind then drop to get a port nothing listens on
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let mut transport = TcpTransport::new("127.0.0.1", port);
        assert!(matches!(transport.connect().await, Err(Error::Io(_))));
    }
}
