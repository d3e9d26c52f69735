//! # zkattend-core
//!
//! Core protocol implementation for ZKTeco biometric devices.
//!
//! This crate provides the low-level protocol primitives:
//! - Packet header and packet encoding/decoding
//! - Payload checksum
//! - Command definitions
//! - Session state machine
//! - CommKey derivation for password-protected devices

pub mod auth;
pub mod checksum;
pub mod command;
pub mod constants;
pub mod error;
pub mod packet;
pub mod session;

pub use auth::make_commkey;
pub use command::Command;
pub use error::{Error, Result};
pub use packet::{Header, Packet};
pub use session::{Session, SessionState};

/// Largest packet a datagram can carry
pub const MAX_PACKET_SIZE: usize = 65535;

/// Packet header size
pub const HEADER_SIZE: usize = 8;
