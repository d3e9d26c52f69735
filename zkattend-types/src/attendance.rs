//! Attendance log records
//!
//! # Record layout (40 bytes)
//!
//! ```text
//! offset  size  field
//! 0       9     user identifier, ASCII, NUL padded
//! 24      4     packed timestamp (LE u32, see `time`)
//! 28      1     status / verify mode
//! 29      1     punch type
//! ```
//!
//! All other bytes are reserved.

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use chrono::NaiveDateTime;

use crate::error::{Error, Result};
use crate::time;

const ID_RANGE: std::ops::Range<usize> = 0..9;
const TIME_RANGE: std::ops::Range<usize> = 24..28;
const STATUS_OFFSET: usize = 28;
const PUNCH_OFFSET: usize = 29;

/// Punch types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PunchType {
    CheckIn = 0,
    CheckOut = 1,
    BreakOut = 2,
    BreakIn = 3,
    OvertimeIn = 4,
    OvertimeOut = 5,
}

impl TryFrom<u8> for PunchType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::CheckIn),
            1 => Ok(Self::CheckOut),
            2 => Ok(Self::BreakOut),
            3 => Ok(Self::BreakIn),
            4 => Ok(Self::OvertimeIn),
            5 => Ok(Self::OvertimeOut),
            _ => Err(Error::Parse(format!("unknown punch type {}", value))),
        }
    }
}

/// One attendance event pulled from a terminal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRecord {
    /// Employee identifier as enrolled on the device
    pub employee_id: String,

    /// Timestamp exactly as stored by the device
    pub packed_time: u32,

    /// Civil time; `None` when the device stored an impossible date
    pub timestamp: Option<NaiveDateTime>,

    /// Raw status code
    pub status: u8,

    /// Raw punch code, see [`PunchType`]
    pub punch_type: u8,
}

impl AttendanceRecord {
    /// Size of one record on the wire
    pub const SIZE: usize = 40;

    /// Longest identifier the record can hold
    pub const MAX_ID_LEN: usize = 9;

    /// Build a record from a civil timestamp
    pub fn new(
        employee_id: impl Into<String>,
        timestamp: NaiveDateTime,
        status: u8,
        punch_type: u8,
    ) -> Result<Self> {
        Ok(Self {
            employee_id: employee_id.into(),
            packed_time: time::encode(&timestamp)?,
            timestamp: Some(timestamp),
            status,
            punch_type,
        })
    }

    /// Decode one record from the first 40 bytes of `raw`
    ///
    /// Only a short buffer is an error. A timestamp that is not a real
    /// calendar date leaves `timestamp` empty and keeps `packed_time`.
    ///
    /// # Examples
    ///
    /// ```
    /// use zkattend_types::AttendanceRecord;
    ///
    /// let mut raw = [0u8; 40];
    /// raw[..3].copy_from_slice(b"123");
    /// raw[24..28].copy_from_slice(&[0x08, 0x95, 0xD9, 0x2E]);
    /// raw[28] = 1;
    ///
    /// let record = AttendanceRecord::decode(&raw).unwrap();
    /// assert_eq!(record.employee_id, "123");
    /// assert_eq!(record.timestamp_string(), "2024-06-15 08:30:00");
    /// ```
    pub fn decode(raw: &[u8]) -> Result<Self> {
        if raw.len() < Self::SIZE {
            return Err(Error::Validation(format!(
                "attendance record needs {} bytes, got {}",
                Self::SIZE,
                raw.len()
            )));
        }

        let employee_id = decode_identifier(&raw[ID_RANGE]);

        let packed_time = LittleEndian::read_u32(&raw[TIME_RANGE]);

        Ok(Self {
            employee_id,
            packed_time,
            timestamp: time::decode(packed_time).ok(),
            status: raw[STATUS_OFFSET],
            punch_type: raw[PUNCH_OFFSET],
        })
    }

    /// Encode into the 40-byte wire layout
    pub fn encode(&self) -> Result<[u8; Self::SIZE]> {
        let id = self.employee_id.as_bytes();
        if id.len() > Self::MAX_ID_LEN || id.contains(&0) {
            return Err(Error::Validation(format!(
                "identifier {:?} does not fit the record",
                self.employee_id
            )));
        }

        let mut raw = [0u8; Self::SIZE];
        raw[..id.len()].copy_from_slice(id);
        LittleEndian::write_u32(&mut raw[TIME_RANGE], self.packed_time);
        raw[STATUS_OFFSET] = self.status;
        raw[PUNCH_OFFSET] = self.punch_type;
        Ok(raw)
    }

    /// Punch type, when the code is a known one
    pub fn punch(&self) -> Option<PunchType> {
        PunchType::try_from(self.punch_type).ok()
    }

    /// Timestamp as `YYYY-MM-DD HH:MM:SS`, rendered even for impossible dates
    pub fn timestamp_string(&self) -> String {
        time::format_packed(self.packed_time)
    }
}

impl fmt::Display for AttendanceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} (status={}, punch={})",
            self.employee_id,
            self.timestamp_string(),
            self.status,
            self.punch_type
        )
    }
}

/// Identifier bytes up to the first NUL, whitespace-trimmed
fn decode_identifier(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn sample_raw() -> [u8; 40] {
        let mut raw = [0u8; 40];
        raw[..3].copy_from_slice(b"123");
        raw[24..28].copy_from_slice(&[0x08, 0x95, 0xD9, 0x2E]);
        raw[28] = 15;
        raw[29] = 1;
        raw
    }

    #[test]
    fn test_decode_record() {
        let record = AttendanceRecord::decode(&sample_raw()).unwrap();

        assert_eq!(record.employee_id, "123");
        assert_eq!(record.timestamp_string(), "2024-06-15 08:30:00");
        assert_eq!(record.status, 15);
        assert_eq!(record.punch_type, 1);
        assert_eq!(record.punch(), Some(PunchType::CheckOut));
    }

    #[test]
    fn test_identifier_padding_stripped() {
        assert_eq!(decode_identifier(b"123\0\0\0\0\0\0"), "123");
        assert_eq!(decode_identifier(b" 42 \0\0\0\0\0"), "42");
        assert_eq!(decode_identifier(b"123456789"), "123456789");
        assert_eq!(decode_identifier(b"\0\0\0\0\0\0\0\0\0"), "");
    }

    #[test]
    fn test_bytes_after_identifier_ignored() {
        let mut raw = sample_raw();
        raw[9..24].copy_from_slice(&[0xAA; 15]);

        assert_eq!(AttendanceRecord::decode(&raw).unwrap().employee_id, "123");
    }

    #[test]
    fn test_impossible_date_is_kept() {
        // 2024-02-31 08:30:00 in the packed calendar
        let packed: u32 = ((24 * 12 + 1) * 31 + 30) * 86_400 + 8 * 3600 + 30 * 60;
        let mut raw = sample_raw();
        raw[24..28].copy_from_slice(&packed.to_le_bytes());

        let record = AttendanceRecord::decode(&raw).unwrap();

        assert_eq!(record.employee_id, "123");
        assert_eq!(record.timestamp, None);
        assert_eq!(record.packed_time, packed);
        assert_eq!(record.timestamp_string(), "2024-02-31 08:30:00");
        assert_eq!(record.encode().unwrap(), raw);
    }

    #[test]
    fn test_decode_short_buffer() {
        assert!(matches!(
            AttendanceRecord::decode(&[0u8; 39]),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_encode_layout() {
        let record = AttendanceRecord::decode(&sample_raw()).unwrap();
        assert_eq!(record.encode().unwrap(), sample_raw());
    }

    #[test]
    fn test_encode_rejects_long_identifier() {
        let mut record = AttendanceRecord::decode(&sample_raw()).unwrap();
        record.employee_id = "1234567890".into();

        assert!(record.encode().is_err());
    }

    #[test]
    fn test_unknown_punch_type() {
        let mut raw = sample_raw();
        raw[29] = 200;

        let record = AttendanceRecord::decode(&raw).unwrap();
        assert_eq!(record.punch_type, 200);
        assert_eq!(record.punch(), None);
    }

    prop_compose! {
        fn arb_record()(
            employee_id in "[0-9]{1,9}",
            days in 0i64..36_000,
            secs in 0u32..86_400,
            status in any::<u8>(),
            punch_type in any::<u8>(),
        ) -> AttendanceRecord {
            let date = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap() + chrono::Duration::days(days);
            let timestamp = date.and_hms_opt(secs / 3600, secs / 60 % 60, secs % 60).unwrap();
            AttendanceRecord::new(employee_id, timestamp, status, punch_type).unwrap()
        }
    }

    proptest! {
        #[test]
        fn identifier_survives_reencode(record in arb_record()) {
            let raw = record.encode().unwrap();
            let decoded = AttendanceRecord::decode(&raw).unwrap();

            prop_assert_eq!(&decoded, &record);
            prop_assert_eq!(decoded.encode().unwrap(), raw);
        }

        #[test]
        fn decoding_is_idempotent(record in arb_record()) {
            let raw = record.encode().unwrap();

            prop_assert_eq!(
                AttendanceRecord::decode(&raw).unwrap(),
                AttendanceRecord::decode(&raw).unwrap()
            );
        }
    }
}
