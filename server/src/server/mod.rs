mod handlers;
mod message_queue;
mod scene_conversion;
mod state;
pub(crate) use state::ServerState;

mod server;
pub use server::Server;

mod server_settings;
pub use server_settings::{ServerSettings, ServerTimeouts};
