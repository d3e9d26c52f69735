//! Protocol-level errors

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Fewer bytes than a header needs
    #[error("packet of {actual} bytes is shorter than the {expected}-byte header")]
    PacketTooShort { expected: usize, actual: usize },

    #[error("command code {0} is not known")]
    UnknownCommand(u16),

    /// Session transition not allowed from the current state
    #[error("session transition rejected: {0}")]
    InvalidSessionState(String),

    #[error("payload of {size} bytes exceeds the {max}-byte limit")]
    PayloadTooLarge { size: usize, max: usize },
}
