//! ZKTeco protocol command definitions

use std::fmt;

use crate::error::{Error, Result};

/// Protocol command codes used by the attendance client
///
/// Request codes are sent by the client, `Ack*` codes come back from the
/// device. `PrepareData` and `Data` travel in both directions during a
/// multi-packet transfer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Command {
    /// Options read (`CMD_OPTIONS_RRQ`), used for device info queries
    Device = 11,
    AttendanceLog = 13,
    ClearAttendanceLog = 15,
    GetTime = 201,

    // Session
    Connect = 1000,
    Exit = 1001,
    EnableDevice = 1002,
    DisableDevice = 1003,
    GetVersion = 1100,
    Auth = 1102,

    // Multi-packet transfer
    PrepareData = 1500,
    Data = 1501,
    FreeData = 1502,

    // Replies
    AckOk = 2000,
    AckError = 2001,
    AckData = 2002,
    AckRetry = 2003,
    AckRepeat = 2004,
    AckUnauth = 2005,
}

impl Command {
    /// Every code this client sends or understands
    pub const ALL: [Command; 19] = [
        Self::Device,
        Self::AttendanceLog,
        Self::ClearAttendanceLog,
        Self::GetTime,
        Self::Connect,
        Self::Exit,
        Self::EnableDevice,
        Self::DisableDevice,
        Self::GetVersion,
        Self::Auth,
        Self::PrepareData,
        Self::Data,
        Self::FreeData,
        Self::AckOk,
        Self::AckError,
        Self::AckData,
        Self::AckRetry,
        Self::AckRepeat,
        Self::AckUnauth,
    ];

    /// Protocol name as used in device documentation
    pub fn name(self) -> &'static str {
        match self {
            Self::Device => "CMD_DEVICE",
            Self::AttendanceLog => "CMD_ATTLOG_RRQ",
            Self::ClearAttendanceLog => "CMD_CLEAR_ATTLOG",
            Self::GetTime => "CMD_GET_TIME",
            Self::Connect => "CMD_CONNECT",
            Self::Exit => "CMD_EXIT",
            Self::EnableDevice => "CMD_ENABLEDEVICE",
            Self::DisableDevice => "CMD_DISABLEDEVICE",
            Self::GetVersion => "CMD_GET_VERSION",
            Self::Auth => "CMD_AUTH",
            Self::PrepareData => "CMD_PREPARE_DATA",
            Self::Data => "CMD_DATA",
            Self::FreeData => "CMD_FREE_DATA",
            Self::AckOk => "CMD_ACK_OK",
            Self::AckError => "CMD_ACK_ERROR",
            Self::AckData => "CMD_ACK_DATA",
            Self::AckRetry => "CMD_ACK_RETRY",
            Self::AckRepeat => "CMD_ACK_REPEAT",
            Self::AckUnauth => "CMD_ACK_UNAUTH",
        }
    }
}

impl From<Command> for u16 {
    fn from(command: Command) -> u16 {
        command as u16
    }
}

impl TryFrom<u16> for Command {
    type Error = Error;

    fn try_from(code: u16) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|&command| u16::from(command) == code)
            .ok_or(Error::UnknownCommand(code))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), *self as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(u16::from(Command::Connect), 1000);
        assert_eq!(Command::try_from(13).unwrap(), Command::AttendanceLog);
        assert_eq!(Command::try_from(1500).unwrap(), Command::PrepareData);
    }

    #[test]
    fn test_every_code_maps_back() {
        for command in Command::ALL {
            assert_eq!(Command::try_from(u16::from(command)).unwrap(), command);
        }
    }

    #[test]
    fn test_unknown_command() {
        assert!(matches!(Command::try_from(9999), Err(Error::UnknownCommand(9999))));
    }

    #[test]
    fn test_command_display() {
        assert_eq!(Command::AttendanceLog.to_string(), "CMD_ATTLOG_RRQ(13)");
    }
}
