//! Session management for ZKTeco protocol
//!
//! A session represents one logical connection to a device and tracks:
//! - Connection state (`Disconnected` → `Connecting` → `Connected`)
//! - Session ID (assigned by device)
//! - Reply counter (advances per command)
//! - Last command issued
//!
//! A session belongs to exactly one client and is mutated through
//! `&mut self`; it is never shared between connections.

use crate::command::Command;
use crate::error::{Error, Result};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No socket, no session id
    Disconnected,

    /// Socket open, CONNECT in flight
    Connecting,

    /// Device assigned a session id
    Connected { session_id: u16 },
}

/// Per-connection protocol state
#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,

    /// Reply counter (starts at USHRT_MAX - 1 = 65534)
    reply_counter: u16,

    last_command: Option<Command>,
}

impl Session {
    /// Initial reply ID (from protocol manual: USHRT_MAX - 1)
    pub const INITIAL_REPLY_ID: u16 = 65534;

    /// Create a new disconnected session
    pub fn new() -> Self {
        Self {
            state: SessionState::Disconnected,
            reply_counter: Self::INITIAL_REPLY_ID,
            last_command: None,
        }
    }

    /// Session ID, or 0 while no session is established
    pub fn session_id(&self) -> u16 {
        match self.state {
            SessionState::Connected { session_id } => session_id,
            _ => 0,
        }
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        matches!(self.state, SessionState::Connected { .. })
    }

    /// Last command sent in this session
    pub fn last_command(&self) -> Option<Command> {
        self.last_command
    }

    /// `Disconnected` → `Connecting`
    pub fn begin_connect(&mut self) -> Result<()> {
        if self.state != SessionState::Disconnected {
            return Err(Error::InvalidSessionState(format!(
                "Cannot start connecting from state: {:?}",
                self.state
            )));
        }

        self.reply_counter = Self::INITIAL_REPLY_ID;
        self.last_command = None;
        self.state = SessionState::Connecting;
        Ok(())
    }

    /// `Connecting` → `Connected` with the device-assigned session id
    pub fn establish(&mut self, session_id: u16) -> Result<()> {
        if self.state != SessionState::Connecting {
            return Err(Error::InvalidSessionState(format!(
                "Cannot establish session from state: {:?}",
                self.state
            )));
        }

        self.state = SessionState::Connected { session_id };
        Ok(())
    }

    /// Reset to `Disconnected` from any state
    pub fn close(&mut self) {
        self.state = SessionState::Disconnected;
        self.reply_counter = Self::INITIAL_REPLY_ID;
        self.last_command = None;
    }

    /// Record `command` as sent and return the reply ID to stamp on it
    ///
    /// Reply ID starts at 65534 and wraps to 0 after 65535.
    pub fn next_reply_id(&mut self, command: Command) -> u16 {
        let current = self.reply_counter;
        self.reply_counter = current.wrapping_add(1);
        self.last_command = Some(command);
        current
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
