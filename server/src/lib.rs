//! # MeshSync Server
//! An HTTP server that receives scene updates from content tools, applies
//! them in fenced scene sessions through the host application, and serves the
//! host's scene back to clients.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod transport;

mod error;
mod files;
mod server;

pub use error::{HttpParseError, ServerError, TransportError};
pub use files::MimeTable;
pub use server::{Server, ServerSettings, ServerTimeouts};
