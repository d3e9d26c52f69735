//! Packed device time
//!
//! Terminals store timestamps as a little-endian u32 counting seconds on a
//! simplified calendar where every month has 31 days and years start at
//! 2000:
//!
//! ```text
//! ((((year - 2000) * 12 + (month - 1)) * 31 + (day - 1)) * 24 + hour) * 60 + minute) * 60 + second
//! ```

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{Error, Result};

/// Calendar fields of a packed time, not checked against the real calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fields {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

/// Split a packed time into its calendar fields
pub fn unpack(packed: u32) -> Fields {
    let mut t = packed;

    let second = t % 60;
    t /= 60;
    let minute = t % 60;
    t /= 60;
    let hour = t % 24;
    t /= 24;
    let day = t % 31 + 1;
    t /= 31;
    let month = t % 12 + 1;
    t /= 12;

    Fields {
        year: 2000 + t as i32,
        month,
        day,
        hour,
        minute,
        second,
    }
}

/// Unpack a packed device time into a civil datetime
///
/// Fails for dates that only exist in the 31-day-month calendar, such as
/// February 31st.
///
/// # Examples
///
/// ```
/// use zkattend_types::time;
///
/// let dt = time::decode(786_011_400).unwrap();
/// assert_eq!(time::format(&dt), "2024-06-15 08:30:00");
/// ```
pub fn decode(packed: u32) -> Result<NaiveDateTime> {
    let f = unpack(packed);

    NaiveDate::from_ymd_opt(f.year, f.month, f.day)
        .and_then(|date| date.and_hms_opt(f.hour, f.minute, f.second))
        .ok_or_else(|| {
            Error::Parse(format!(
                "invalid device time 0x{:08X} ({})",
                packed,
                format_packed(packed)
            ))
        })
}

/// Render a packed time as `YYYY-MM-DD HH:MM:SS` without calendar checks
///
/// ```
/// use zkattend_types::time;
///
/// assert_eq!(time::format_packed(786_011_400), "2024-06-15 08:30:00");
/// ```
pub fn format_packed(packed: u32) -> String {
    let f = unpack(packed);
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        f.year, f.month, f.day, f.hour, f.minute, f.second
    )
}

/// Pack a civil datetime; years before 2000 cannot be represented
pub fn encode(dt: &NaiveDateTime) -> Result<u32> {
    let year = dt.year();
    if !(2000..=2132).contains(&year) {
        return Err(Error::Validation(format!(
            "year {} outside device range",
            year
        )));
    }

    let days = ((year - 2000) as u32 * 12 + dt.month0()) * 31 + dt.day0();
    Ok(((days * 24 + dt.hour()) * 60 + dt.minute()) * 60 + dt.second())
}

/// Render as `YYYY-MM-DD HH:MM:SS`
pub fn format(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_known_bytes() {
        // 2024-06-15 08:30:00 as stored on the wire
        let dt = decode(u32::from_le_bytes([0x08, 0x95, 0xD9, 0x2E])).unwrap();
        assert_eq!(format(&dt), "2024-06-15 08:30:00");
    }

    #[test]
    fn test_decode_epoch() {
        let dt = decode(0).unwrap();
        assert_eq!(format(&dt), "2000-01-01 00:00:00");
    }

    #[test]
    fn test_decode_impossible_date() {
        // February 31st exists in the packed calendar only
        let packed = ((24 * 12 + 1) * 31 + 30) * 86_400;
        assert!(matches!(decode(packed), Err(Error::Parse(_))));
    }

    #[test]
    fn test_format_packed_keeps_impossible_date() {
        let packed = ((24 * 12 + 1) * 31 + 30) * 86_400 + 8 * 3600 + 30 * 60;
        assert_eq!(format_packed(packed), "2024-02-31 08:30:00");
    }

    #[test]
    fn test_format_packed_matches_format() {
        let dt = decode(786_011_400).unwrap();
        assert_eq!(format_packed(786_011_400), format(&dt));
    }

    #[test]
    fn test_encode_decode() {
        let dt = NaiveDate::from_ymd_opt(2031, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();

        assert_eq!(decode(encode(&dt).unwrap()).unwrap(), dt);
    }

    #[test]
    fn test_encode_rejects_old_years() {
        let dt = NaiveDate::from_ymd_opt(1999, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        assert!(encode(&dt).is_err());
    }
}
