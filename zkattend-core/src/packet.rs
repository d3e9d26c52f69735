//! ZKTeco protocol packet structure and encoding/decoding

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;

use crate::{
    checksum,
    command::Command,
    error::{Error, Result},
};

/// Fixed 8-byte packet header
///
/// # Layout
///
/// ```text
/// ┌─────────────┬─────────────┬─────────────┬─────────────┐
/// │   Command   │  Checksum   │  SessionID  │  ReplyID    │
/// │   2 bytes   │   2 bytes   │   2 bytes   │   2 bytes   │
/// │ (LE u16)    │  (LE u16)   │  (LE u16)   │  (LE u16)   │
/// └─────────────┴─────────────┴─────────────┴─────────────┘
/// ```
///
/// The command is kept as the raw code so replies carrying codes this
/// crate does not model still parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub command: u16,
    pub checksum: u16,
    pub session_id: u16,
    pub reply_id: u16,
}

impl Header {
    /// Header size in bytes
    pub const SIZE: usize = 8;

    /// Build a header with a zero checksum
    pub fn new(command: Command, session_id: u16, reply_id: u16) -> Self {
        Self {
            command: command.into(),
            checksum: 0,
            session_id,
            reply_id,
        }
    }

    /// Append the four little-endian words to `buf`
    pub fn encode_into(&self, buf: &mut BytesMut) {
        buf.put_u16_le(self.command);
        buf.put_u16_le(self.checksum);
        buf.put_u16_le(self.session_id);
        buf.put_u16_le(self.reply_id);
    }

    /// Encode to a fixed array
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = BytesMut::with_capacity(Self::SIZE);
        self.encode_into(&mut buf);

        let mut out = [0u8; Self::SIZE];
        out.copy_from_slice(&buf);
        out
    }

    /// Parse the first 8 bytes of `raw`
    ///
    /// # Examples
    ///
    /// ```
    /// use zkattend_core::Header;
    ///
    /// let raw = [0xD0, 0x07, 0x00, 0x00, 0x34, 0x12, 0x01, 0x00];
    /// let header = Header::decode(&raw).unwrap();
    /// assert_eq!(header.command, 2000);
    /// assert_eq!(header.session_id, 0x1234);
    /// ```
    pub fn decode(mut raw: &[u8]) -> Result<Self> {
        if raw.len() < Self::SIZE {
            return Err(Error::PacketTooShort {
                expected: Self::SIZE,
                actual: raw.len(),
            });
        }

        Ok(Self {
            command: raw.get_u16_le(),
            checksum: raw.get_u16_le(),
            session_id: raw.get_u16_le(),
            reply_id: raw.get_u16_le(),
        })
    }

    /// Typed command, if the code is one this crate knows
    pub fn command(&self) -> Option<Command> {
        Command::try_from(self.command).ok()
    }
}

/// ZKTeco protocol packet: header followed by a command-specific payload
///
/// # Examples
///
/// ```
/// use zkattend_core::{Packet, Command};
///
/// let packet = Packet::new(Command::Connect, 0, 0);
/// let encoded = packet.encode();
///
/// let decoded = Packet::decode(encoded).unwrap();
/// assert!(decoded.is(Command::Connect));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Packet {
    pub header: Header,

    /// Packet payload (command-specific data)
    pub payload: Bytes,
}

impl Packet {
    /// Packet header size in bytes
    pub const HEADER_SIZE: usize = Header::SIZE;

    /// Maximum payload size
    pub const MAX_PAYLOAD_SIZE: usize = crate::MAX_PACKET_SIZE - Self::HEADER_SIZE;

    /// Create a new packet with empty payload
    pub fn new(command: Command, session_id: u16, reply_id: u16) -> Self {
        Self {
            header: Header::new(command, session_id, reply_id),
            payload: Bytes::new(),
        }
    }

    /// Create a packet with payload
    ///
    /// # Examples
    ///
    /// ```
    /// use zkattend_core::{Packet, Command};
    ///
    /// let packet = Packet::with_payload(Command::Device, 1234, 1, &b"~SerialNumber\0"[..]);
    /// assert_eq!(packet.payload.len(), 14);
    /// assert_eq!(packet.header.checksum, 0);
    /// ```
    pub fn with_payload(
        command: Command,
        session_id: u16,
        reply_id: u16,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            header: Header::new(command, session_id, reply_id),
            payload: payload.into(),
        }
    }

    /// Fill the header checksum from the payload
    pub fn sealed(mut self) -> Self {
        self.header.checksum = checksum::calculate(&self.payload);
        self
    }

    /// Typed command of this packet
    pub fn command(&self) -> Option<Command> {
        self.header.command()
    }

    /// Check whether the packet carries `command`
    pub fn is(&self, command: Command) -> bool {
        self.header.command == u16::from(command)
    }

    /// Encode packet to bytes
    ///
    /// # Examples
    ///
    /// ```
    /// use zkattend_core::{Packet, Command};
    ///
    /// let packet = Packet::new(Command::Connect, 0, 0);
    /// let bytes = packet.encode();
    /// assert_eq!(bytes.len(), 8); // Header only
    /// ```
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.size());
        self.header.encode_into(&mut buf);
        buf.put_slice(&self.payload);
        buf
    }

    /// Decode packet from bytes
    ///
    /// Only the length is checked: the checksum is carried through as
    /// received and unknown command codes are kept raw.
    pub fn decode(mut buf: BytesMut) -> Result<Self> {
        let header = Header::decode(&buf)?;
        buf.advance(Header::SIZE);

        if buf.len() > Self::MAX_PAYLOAD_SIZE {
            return Err(Error::PayloadTooLarge {
                size: buf.len(),
                max: Self::MAX_PAYLOAD_SIZE,
            });
        }

        Ok(Self {
            header,
            payload: buf.freeze(),
        })
    }

    /// Get total packet size
    pub fn size(&self) -> usize {
        Self::HEADER_SIZE + self.payload.len()
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("command", &self.command().map(Command::name).unwrap_or("CMD_UNKNOWN"))
            .field("code", &self.header.command)
            .field("session_id", &format!("0x{:04X}", self.header.session_id))
            .field("reply_id", &format!("0x{:04X}", self.header.reply_id))
            .field("checksum", &format!("0x{:04X}", self.header.checksum))
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.command() {
            Some(command) => write!(f, "Packet[{}]", command)?,
            None => write!(f, "Packet[CMD_UNKNOWN({})]", self.header.command)?,
        }
        write!(
            f,
            "(session={}, reply={}, len={})",
            self.header.session_id,
            self.header.reply_id,
            self.payload.len()
        )
    }
}
