use std::io;

use thiserror::Error;

use meshsync_shared::ProtocolError;

/// Failures of a single request to a MeshSync server
#[derive(Debug, Error)]
pub enum ClientError {
    /// Nothing accepted the connection
    #[error("Could not reach server")]
    Unreachable,

    /// The server accepted but didn't answer in time
    #[error("Could not reach server (timeout)")]
    Timeout,

    #[error("Server speaks protocol version {server}, this client speaks {client}")]
    VersionMismatch { server: i32, client: i32 },

    /// The server answered with a non-success status
    #[error("Server answered with status {status}")]
    Status { status: u16 },

    /// The response body couldn't be decoded
    #[error("Invalid response: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    /// The client's runtime or HTTP stack couldn't be set up
    #[error("Failed to set up the client runtime: {0}")]
    Runtime(#[from] io::Error),
}

impl ClientError {
    pub(crate) fn from_request(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Unreachable
        } else {
            Self::Http(error)
        }
    }
}
