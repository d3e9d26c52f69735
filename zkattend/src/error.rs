//! High-level error types

use zkattend_types::Endpoint;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] zkattend_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] zkattend_transport::Error),

    #[error("Type error: {0}")]
    Types(#[from] zkattend_types::Error),

    #[error("Device not connected")]
    NotConnected,

    #[error("Invalid response from device: {0}")]
    InvalidResponse(String),

    /// Fragment stream stopped before the announced size arrived
    #[error("Incomplete data transfer: received {received} of {expected} bytes")]
    IncompleteTransfer {
        received: usize,
        expected: usize,
    },

    /// Neither UDP nor TCP produced a session
    #[error("Could not connect to device {endpoint} over UDP or TCP")]
    ConnectFailed {
        endpoint: Endpoint,
    },

    /// Attendance fetch still failing after the recovery cycle
    #[error("Attendance fetch from {endpoint} failed after recovery attempt: {reason}")]
    FetchFailed {
        endpoint: Endpoint,
        reason: String,
    },
}
