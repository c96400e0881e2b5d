//! # MeshSync Client
//! Talks to a meshsync-server over HTTP. `Client` issues single blocking
//! requests, `AsyncSceneSender` streams a batch of changes as one fenced
//! scene session from a background thread.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

mod async_scene_sender;
mod client;
mod client_settings;
mod error;
mod id_table;
mod scene_batch;
mod scene_transport;

pub use async_scene_sender::AsyncSceneSender;
pub use client::Client;
pub use client_settings::ClientSettings;
pub use error::ClientError;
pub use id_table::IdTable;
pub use scene_batch::SceneBatch;
pub use scene_transport::SceneTransport;
