//! Wire client for a single terminal
//!
//! [`Device`] frames, sends and parses protocol packets over one transport
//! and keeps the session counters. It never reconnects or switches
//! transports on its own; that policy lives in [`crate::DeviceManager`].

use std::time::Duration;

use byteorder::{ByteOrder, LittleEndian};
use bytes::{Bytes, BytesMut};
use chrono::NaiveDateTime;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use zkattend_core::constants::{options, COMMKEY_TICKS};
use zkattend_core::{make_commkey, Command, Header, Packet, Session};
use zkattend_transport::{TcpTransport, Transport, TransportMode, UdpTransport};
use zkattend_types::{time, AttendanceRecord, DeviceInfoField, Endpoint};

use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// Upper bound on the buffer reserved up front for a data transfer
const INITIAL_DATA_CAPACITY: usize = 64 * 1024;

/// ZKTeco device
///
/// # Examples
///
/// ```no_run
/// use zkattend::{Device, Endpoint, TransportMode};
///
/// #[tokio::main]
/// async fn main() -> zkattend::Result<()> {
///     let mut device = Device::new(Endpoint::with_default_port("192.168.1.201"), TransportMode::Udp);
///
///     if device.connect().await? {
///         if let Some(records) = device.get_attendance().await? {
///             println!("{} records", records.len());
///         }
///     }
///
///     device.disconnect().await
/// }
/// ```
pub struct Device {
    endpoint: Endpoint,
    transport: Box<dyn Transport>,
    session: Session,
    config: ClientConfig,
}

impl Device {
    /// Create a device client with default settings
    pub fn new(endpoint: Endpoint, mode: TransportMode) -> Self {
        Self::with_settings(endpoint, mode, ClientConfig::default())
    }

    /// Create a device client; the TCP connect timeout follows `config.timeout`
    pub fn with_settings(endpoint: Endpoint, mode: TransportMode, config: ClientConfig) -> Self {
        let transport: Box<dyn Transport> = match mode {
            TransportMode::Udp => Box::new(UdpTransport::new(endpoint.ip.clone(), endpoint.port)),
            TransportMode::Tcp => Box::new(
                TcpTransport::new(endpoint.ip.clone(), endpoint.port)
                    .with_connect_timeout(config.timeout),
            ),
        };

        Self::with_transport(endpoint, transport).with_config(config)
    }

    /// Create a device client over an already-built transport
    pub fn with_transport(endpoint: Endpoint, transport: Box<dyn Transport>) -> Self {
        Self {
            endpoint,
            transport,
            session: Session::new(),
            config: ClientConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set command timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn mode(&self) -> TransportMode {
        self.transport.mode()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.session.is_connected() && self.transport.is_connected()
    }

    /// Open the socket and establish a session
    ///
    /// Returns `Ok(false)` when the device never answers CONNECT within the
    /// retry budget. Errors are reserved for transport setup failures.
    pub async fn connect(&mut self) -> Result<bool> {
        if self.is_connected() {
            return Ok(true);
        }

        // Drop leftovers from an earlier half-open attempt
        self.teardown().await;
        self.session.begin_connect()?;

        info!(endpoint = %self.endpoint, mode = %self.mode(), "Connecting to device");

        if let Err(e) = self.transport.connect().await {
            self.session.close();
            return Err(e.into());
        }

        let reply = match self.mode() {
            TransportMode::Udp => self.connect_udp().await,
            TransportMode::Tcp => self.connect_tcp().await,
        };

        match reply {
            Ok(Some(header)) => {
                self.session.establish(header.session_id)?;
                info!(
                    endpoint = %self.endpoint,
                    mode = %self.mode(),
                    session_id = header.session_id,
                    reply = header.command,
                    "Connected"
                );
                Ok(true)
            }
            Ok(None) => {
                warn!(endpoint = %self.endpoint, mode = %self.mode(), "No reply to CONNECT");
                self.teardown().await;
                Ok(false)
            }
            Err(e) => {
                self.teardown().await;
                Err(e)
            }
        }
    }

    /// UDP gives no delivery guarantee: resend CONNECT and poll for the reply
    async fn connect_udp(&mut self) -> Result<Option<Header>> {
        let retry = self.config.connect_retry;

        for attempt in 1..=retry.send_attempts {
            let packet = self.create_packet(Command::Connect, Bytes::new());
            self.send_packet(&packet).await?;

            for _ in 0..retry.poll_attempts {
                match self.transport.receive(retry.poll_timeout).await {
                    Ok(buf) if buf.len() >= Header::SIZE => {
                        return Ok(Some(Header::decode(&buf)?));
                    }
                    Ok(buf) => trace!(len = buf.len(), "Ignoring short datagram"),
                    Err(e) if e.is_timeout() => {}
                    // ICMP errors surface here; keep polling within budget
                    Err(e) => debug!(error = %e, "Receive failed while polling"),
                }

                tokio::time::sleep(retry.poll_interval).await;
            }

            debug!(attempt, "No reply to CONNECT yet");
        }

        Ok(None)
    }

    async fn connect_tcp(&mut self) -> Result<Option<Header>> {
        let packet = self.create_packet(Command::Connect, Bytes::new());
        self.send_packet(&packet).await?;

        match self.transport.receive(self.config.timeout).await {
            Ok(buf) => Ok(Some(Header::decode(&buf)?)),
            Err(e) if e.is_timeout() => Ok(None),
            Err(zkattend_transport::Error::ConnectionClosed) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Close the session
    ///
    /// Sends EXIT without waiting for its reply, then always closes the
    /// socket. Safe to call when not connected.
    pub async fn disconnect(&mut self) -> Result<()> {
        if self.is_connected() {
            info!(endpoint = %self.endpoint, "Disconnecting");

            let packet = self.create_packet(Command::Exit, Bytes::new());
            if let Err(e) = self.send_packet(&packet).await {
                warn!("Failed to send EXIT command: {}", e);
            }
        }

        let closed = self.transport.disconnect().await;
        self.session.close();
        closed.map_err(Into::into)
    }

    /// Enable device (normal operation mode)
    pub async fn enable_device(&mut self) -> Result<bool> {
        debug!("Enabling device...");
        self.simple_command(Command::EnableDevice).await
    }

    /// Disable device (show "Working..." on LCD)
    pub async fn disable_device(&mut self) -> Result<bool> {
        debug!("Disabling device...");
        self.simple_command(Command::DisableDevice).await
    }

    /// Erase the attendance log on the device
    pub async fn clear_attendance(&mut self) -> Result<bool> {
        let cleared = self.simple_command(Command::ClearAttendanceLog).await?;
        info!(endpoint = %self.endpoint, cleared, "Clear attendance log");
        Ok(cleared)
    }

    /// Download the attendance log
    ///
    /// `Ok(None)` means the device offered no data (any reply other than
    /// PREPARE_DATA, or no reply). A failure while pulling fragments fails
    /// the whole call.
    pub async fn get_attendance(&mut self) -> Result<Option<Vec<AttendanceRecord>>> {
        if !self.is_connected() {
            return Ok(None);
        }

        let reply = match self.exchange(Command::AttendanceLog, Bytes::new()).await? {
            Some(reply) => reply,
            None => return Ok(None),
        };

        if !reply.is(Command::PrepareData) {
            debug!(reply = %reply, "Device offered no attendance data");
            return Ok(None);
        }

        let total = declared_size(&reply)?;
        let data = self.collect_data(total).await?;
        let records = decode_attendance(&data)?;

        info!(
            endpoint = %self.endpoint,
            bytes = total,
            records = records.len(),
            "Fetched attendance log"
        );

        Ok(Some(records))
    }

    /// Pull DATA fragments until `total` payload bytes are buffered
    async fn collect_data(&mut self, total: usize) -> Result<BytesMut> {
        // The declared size is untrusted; grow past the hint as fragments arrive
        let mut data = BytesMut::with_capacity(total.min(INITIAL_DATA_CAPACITY));

        while data.len() < total {
            let incomplete = Error::IncompleteTransfer {
                received: data.len(),
                expected: total,
            };

            let fragment = match self.exchange(Command::Data, Bytes::new()).await? {
                Some(fragment) if !fragment.payload.is_empty() => fragment,
                _ => return Err(incomplete),
            };

            trace!(
                fragment = fragment.payload.len(),
                received = data.len() + fragment.payload.len(),
                expected = total,
                "Received data fragment"
            );
            data.extend_from_slice(&fragment.payload);
        }

        data.truncate(total);
        Ok(data)
    }

    /// Query one descriptive field
    pub async fn get_device_info(&mut self, field: DeviceInfoField) -> Result<Option<String>> {
        if !self.is_connected() {
            return Ok(None);
        }

        let (command, payload) = match field {
            DeviceInfoField::FirmwareVersion => (Command::GetVersion, Bytes::new()),
            DeviceInfoField::DeviceName => (Command::Device, option_request(options::DEVICE_NAME)),
            DeviceInfoField::SerialNumber => {
                (Command::Device, option_request(options::SERIAL_NUMBER))
            }
            DeviceInfoField::Platform => (Command::Device, option_request(options::PLATFORM)),
            DeviceInfoField::MacAddress => (Command::Device, option_request(options::MAC_ADDRESS)),
        };

        let value = match self.exchange(command, payload).await? {
            Some(reply) if reply.is(Command::AckOk) => Some(option_value(&reply.payload)),
            _ => None,
        };

        debug!(%field, ?value, "Device info");
        Ok(value)
    }

    /// Read the device clock
    pub async fn get_time(&mut self) -> Result<Option<NaiveDateTime>> {
        if !self.is_connected() {
            return Ok(None);
        }

        match self.exchange(Command::GetTime, Bytes::new()).await? {
            Some(reply) if reply.is(Command::AckOk) && reply.payload.len() >= 4 => {
                let packed = LittleEndian::read_u32(&reply.payload[..4]);
                Ok(Some(time::decode(packed)?))
            }
            _ => Ok(None),
        }
    }

    /// Answer a CommKey challenge with `pin`
    pub async fn authenticate(&mut self, pin: u32) -> Result<bool> {
        if !self.is_connected() {
            return Ok(false);
        }

        let key = make_commkey(pin, self.session.session_id(), COMMKEY_TICKS);
        let accepted = matches!(
            self.exchange(Command::Auth, Bytes::copy_from_slice(&key)).await?,
            Some(reply) if reply.is(Command::AckOk)
        );

        debug!(accepted, "CommKey authentication");
        Ok(accepted)
    }

    // Helper methods

    /// One request, true iff the reply is ACK_OK; no I/O when disconnected
    async fn simple_command(&mut self, command: Command) -> Result<bool> {
        if !self.is_connected() {
            return Ok(false);
        }

        let reply = self.exchange(command, Bytes::new()).await?;
        Ok(matches!(reply, Some(reply) if reply.is(Command::AckOk)))
    }

    async fn exchange(&mut self, command: Command, payload: Bytes) -> Result<Option<Packet>> {
        let packet = self.create_packet(command, payload);
        self.send_packet(&packet).await?;
        self.receive_packet(packet.header.reply_id).await
    }

    fn create_packet(&mut self, command: Command, payload: Bytes) -> Packet {
        let reply_id = self.session.next_reply_id(command);
        let packet = Packet::with_payload(command, self.session.session_id(), reply_id, payload);

        if self.config.fill_checksum {
            packet.sealed()
        } else {
            packet
        }
    }

    async fn send_packet(&mut self, packet: &Packet) -> Result<()> {
        trace!("Sending: {:?}", packet);

        let data = packet.encode();
        self.transport.send(&data).await?;

        Ok(())
    }

    /// Reply carrying `reply_id`, or `None` on timeout
    ///
    /// Late replies to earlier requests are discarded; the timeout bounds
    /// the whole wait, not each read.
    async fn receive_packet(&mut self, reply_id: u16) -> Result<Option<Packet>> {
        let deadline = Instant::now() + self.config.timeout;

        loop {
            let wait = deadline.saturating_duration_since(Instant::now());

            let buf = match self.transport.receive(wait).await {
                Ok(buf) => buf,
                Err(e) if e.is_timeout() => {
                    debug!(
                        command = ?self.session.last_command(),
                        reply_id,
                        "Timed out waiting for reply"
                    );
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            };

            let packet = Packet::decode(buf)?;
            if packet.header.reply_id != reply_id {
                trace!(
                    expected = reply_id,
                    received = packet.header.reply_id,
                    "Discarding stale reply: {:?}",
                    packet
                );
                continue;
            }

            trace!("Received: {:?}", packet);
            return Ok(Some(packet));
        }
    }

    async fn teardown(&mut self) {
        if let Err(e) = self.transport.disconnect().await {
            debug!(error = %e, "Closing transport failed");
        }
        self.session.close();
    }
}

/// Total size announced by a PREPARE_DATA reply
fn declared_size(reply: &Packet) -> Result<usize> {
    if reply.payload.len() < 4 {
        return Err(Error::InvalidResponse(format!(
            "PREPARE_DATA without size field ({} payload bytes)",
            reply.payload.len()
        )));
    }

    Ok(LittleEndian::read_u32(&reply.payload[..4]) as usize)
}

/// Split an assembled log into 40-byte records
///
/// Yields exactly `data.len() / 40` records; a trailing partial record is
/// dropped. Records with an impossible date are kept with an empty
/// `timestamp` and logged.
pub fn decode_attendance(data: &[u8]) -> Result<Vec<AttendanceRecord>> {
    let chunks = data.chunks_exact(AttendanceRecord::SIZE);

    if !chunks.remainder().is_empty() {
        debug!(
            trailing = chunks.remainder().len(),
            "Dropping partial attendance record"
        );
    }

    chunks
        .enumerate()
        .map(|(index, raw)| {
            let record = AttendanceRecord::decode(raw)?;
            if record.timestamp.is_none() {
                warn!(
                    index,
                    employee_id = %record.employee_id,
                    packed = record.packed_time,
                    "Attendance record has an impossible date"
                );
            }
            Ok(record)
        })
        .collect()
}

/// NUL-terminated option key for the DEVICE command
fn option_request(key: &str) -> Bytes {
    let mut payload = Vec::with_capacity(key.len() + 1);
    payload.extend_from_slice(key.as_bytes());
    payload.push(0);
    Bytes::from(payload)
}

/// Value part of a `key=value\0` option reply
fn option_value(payload: &[u8]) -> String {
    let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
    let text = String::from_utf8_lossy(&payload[..end]);

    match text.split_once('=') {
        Some((_, value)) => value.trim().to_string(),
        None => text.trim().to_string(),
    }
}
