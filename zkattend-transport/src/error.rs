//! Socket-level errors

use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("transport is not open")]
    NotConnected,

    #[error("transport is already open")]
    AlreadyConnected,

    #[error("timed out opening connection")]
    ConnectionTimeout,

    #[error("timed out waiting for data")]
    ReadTimeout,

    /// Peer closed the stream mid-frame or before replying
    #[error("peer closed the connection")]
    ConnectionClosed,

    #[error("socket error: {0}")]
    Io(#[from] io::Error),

    /// Host did not resolve to any address
    #[error("cannot resolve {0}")]
    InvalidAddress(String),

    #[error("malformed TCP frame: {0}")]
    InvalidFrame(String),
}

impl Error {
    /// Routine on device links; callers treat it as "no reply"
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ReadTimeout | Self::ConnectionTimeout)
    }
}
