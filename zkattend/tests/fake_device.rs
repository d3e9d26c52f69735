//! End-to-end checks against an in-process terminal on localhost

use std::time::Duration;

use bytes::{BufMut, BytesMut};
use pretty_assertions::assert_eq;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};

use zkattend::{
    ClientConfig, Command, ConnectRetry, DeviceManager, Endpoint, ManagerConfig, Packet,
    TransportMode,
};
use zkattend_transport::tcp::{frame, parse_frame_prefix};

const SESSION_ID: u16 = 0x4D2;

/// Terminal state shared by the UDP and TCP front ends
struct FakeTerminal {
    log: Vec<u8>,
    cursor: usize,
    fragment: usize,
}

impl FakeTerminal {
    fn with_records(ids: &[&str]) -> Self {
        let mut log = Vec::new();
        for id in ids {
            let mut raw = [0u8; 40];
            raw[..id.len()].copy_from_slice(id.as_bytes());
            // 2024-06-15 08:30:00
            raw[24..28].copy_from_slice(&[0x08, 0x95, 0xD9, 0x2E]);
            raw[28] = 1;
            log.extend_from_slice(&raw);
        }

        Self {
            log,
            cursor: 0,
            fragment: 48,
        }
    }

    fn reply(&mut self, request: &Packet) -> Packet {
        let ack = |command: Command, payload: Vec<u8>| {
            Packet::with_payload(command, SESSION_ID, request.header.reply_id, payload)
        };

        match request.command() {
            Some(
                Command::Connect | Command::Exit | Command::EnableDevice | Command::DisableDevice,
            ) => ack(Command::AckOk, vec![]),
            Some(Command::AttendanceLog) => {
                self.cursor = 0;
                ack(Command::PrepareData, (self.log.len() as u32).to_le_bytes().to_vec())
            }
            Some(Command::Data) => {
                let end = (self.cursor + self.fragment).min(self.log.len());
                let chunk = self.log[self.cursor..end].to_vec();
                self.cursor = end;
                ack(Command::Data, chunk)
            }
            Some(Command::GetVersion) => ack(Command::AckOk, b"Ver 6.60 Apr 28 2017\0".to_vec()),
            Some(Command::Device) if request.payload.starts_with(b"~SerialNumber") => {
                ack(Command::AckOk, b"~SerialNumber=FAKE0001\0".to_vec())
            }
            _ => ack(Command::AckError, vec![]),
        }
    }
}

async fn spawn_udp(mut terminal: FakeTerminal) -> u16 {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = socket.local_addr().unwrap().port();

    tokio::spawn(async move {
        let mut buf = vec![0u8; 2048];
        loop {
            let Ok((n, peer)) = socket.recv_from(&mut buf).await else {
                return;
            };
            let request = Packet::decode(BytesMut::from(&buf[..n])).unwrap();
            let reply = terminal.reply(&request);
            socket.send_to(&reply.encode(), peer).await.unwrap();
        }
    });

    port
}

async fn spawn_tcp(mut terminal: FakeTerminal) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        loop {
            let mut prefix = [0u8; 8];
            if stream.read_exact(&mut prefix).await.is_err() {
                return;
            }
            let len = parse_frame_prefix(&prefix).unwrap();

            let mut body = BytesMut::zeroed(len);
            stream.read_exact(&mut body).await.unwrap();

            let request = Packet::decode(body).unwrap();
            let reply = terminal.reply(&request);
            stream.write_all(&frame(&reply.encode())).await.unwrap();
        }
    });

    port
}

fn config() -> ManagerConfig {
    let retry = ConnectRetry {
        send_attempts: 1,
        poll_attempts: 2,
        poll_timeout: Duration::from_millis(100),
        poll_interval: Duration::from_millis(10),
    };

    ManagerConfig::default()
        .with_client(
            ClientConfig::default()
                .with_timeout(Duration::from_secs(2))
                .with_connect_retry(retry),
        )
        .with_recovery_pause(Duration::from_millis(50))
}

#[tokio::test]
async fn test_udp_fetch_spans_fragments() {
    let port = spawn_udp(FakeTerminal::with_records(&["1", "22", "333"])).await;
    let mut manager = DeviceManager::new(Endpoint::new("127.0.0.1", port)).with_config(config());

    let records = manager.get_attendance().await.unwrap();

    assert_eq!(manager.active_mode(), Some(TransportMode::Udp));
    let ids: Vec<_> = records.iter().map(|r| r.employee_id.as_str()).collect();
    assert_eq!(ids, ["1", "22", "333"]);
    assert_eq!(records[2].timestamp_string(), "2024-06-15 08:30:00");

    manager.disconnect().await;
    assert!(!manager.is_connected());
}

#[tokio::test]
async fn test_tcp_fallback_when_udp_is_silent() {
    let port = spawn_tcp(FakeTerminal::with_records(&["7"])).await;
    let mut manager = DeviceManager::new(Endpoint::new("127.0.0.1", port)).with_config(config());

    assert!(manager.connect().await);
    assert_eq!(manager.active_mode(), Some(TransportMode::Tcp));

    let records = manager.get_attendance().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].employee_id, "7");

    manager.disconnect().await;
}

#[tokio::test]
async fn test_empty_log_fails_after_recovery() {
    let port = spawn_udp(FakeTerminal::with_records(&[])).await;
    let mut manager = DeviceManager::new(Endpoint::new("127.0.0.1", port)).with_config(config());

    assert!(matches!(
        manager.get_attendance().await,
        Err(zkattend::Error::FetchFailed { .. })
    ));
    // Connection survives the failed fetch
    assert!(manager.is_connected());
}

#[tokio::test]
async fn test_device_info_over_udp() {
    let port = spawn_udp(FakeTerminal::with_records(&[])).await;
    let mut manager = DeviceManager::new(Endpoint::new("127.0.0.1", port)).with_config(config());

    let info = manager.get_device_info().await.unwrap();

    assert_eq!(info.serial_number, "FAKE0001");
    assert_eq!(info.firmware_version, "Ver 6.60 Apr 28 2017");
    assert_eq!(info.device_name, "N/A");
    assert_eq!(info.mac_address, "N/A");
}

#[tokio::test]
async fn test_unreachable_device_fails_to_connect() {
    // Bound but never answering
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = socket.local_addr().unwrap().port();

    let mut manager = DeviceManager::new(Endpoint::new("127.0.0.1", port)).with_config(config());

    assert!(matches!(
        manager.get_attendance().await,
        Err(zkattend::Error::ConnectFailed { .. })
    ));
    drop(socket);
}

#[test]
fn test_frame_layout() {
    let packet = Packet::new(Command::Connect, 0, 0xFFFE).encode();
    let framed = frame(&packet);

    let mut expected = BytesMut::new();
    expected.put_slice(&[0x50, 0x50, 0x82, 0x7D, 0x08, 0x00, 0x00, 0x00]);
    expected.put_slice(&[0xE8, 0x03, 0x00, 0x00, 0x00, 0x00, 0xFE, 0xFF]);
    assert_eq!(framed, expected);
}
