use std::io;

use thiserror::Error;

/// Errors that can occur while starting or running the Server
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be bound
    #[error("Failed to bind MeshSync server to port {port}: {source}. Another process may already be listening on it")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },

    /// start() was called while the server was already listening
    #[error("MeshSync server is already running. Call stop() before starting it again")]
    AlreadyRunning,

    /// Socket configuration failed after binding
    #[error("I/O error on the MeshSync server socket: {0}")]
    Io(#[from] io::Error),

    /// The acceptor thread could not be spawned
    #[error("Failed to spawn the MeshSync acceptor thread: {0}")]
    Runtime(String),
}

/// Errors that can occur while parsing an inbound HTTP request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpParseError {
    /// Missing required component in the request head
    #[error("Missing required component in HTTP {message_type}: {component}. The HTTP message is malformed")]
    MissingComponent {
        message_type: &'static str,
        component: &'static str,
    },

    /// The request head is not valid UTF-8
    #[error("HTTP request head is not valid UTF-8")]
    InvalidEncoding,

    /// Invalid HTTP method in request
    #[error("Invalid HTTP method '{method}' in request. Method must be a valid HTTP verb")]
    InvalidMethod { method: String },

    /// A header line has no ':' separator or an invalid name/value
    #[error("Invalid HTTP header line '{line}'")]
    InvalidHeader { line: String },

    /// Content-Length is present but not a number
    #[error("Invalid Content-Length '{value}'. Content-Length must be a non-negative integer")]
    InvalidContentLength { value: String },

    /// The request head did not terminate within the size limit
    #[error("HTTP request head exceeds {limit} bytes")]
    HeadTooLarge { limit: usize },

    /// The declared body is larger than the server accepts
    #[error("HTTP request body of {length} bytes exceeds the limit of {limit} bytes")]
    BodyTooLarge { length: usize, limit: usize },

    /// Failed to build HTTP request
    #[error("Failed to build HTTP request. Invalid request parameters provided")]
    RequestBuildFailed,
}

/// Errors that end the handling of one connection
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP parse error
    #[error("HTTP parse error: {0}")]
    HttpParse(#[from] HttpParseError),

    /// Socket read/write failure
    #[error("Connection I/O error: {0}")]
    Io(#[from] io::Error),
}
