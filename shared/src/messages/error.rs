use thiserror::Error;

use meshsync_serde::SerdeErr;

/// Errors that can occur when decoding a message off the wire
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The peer speaks another protocol version
    #[error("Protocol version {actual} doesn't match the expected version {expected}. Both ends must run the same protocol")]
    VersionMismatch { expected: i32, actual: i32 },

    /// The message body couldn't be decoded
    #[error("Malformed message: {0}")]
    Serde(#[from] SerdeErr),

    /// The message decoded but bytes were left over
    #[error("{count} unexpected trailing bytes after the message")]
    TrailingBytes { count: usize },
}
