/// Wire protocol version. Peers with a different value refuse each other's messages.
pub const PROTOCOL_VERSION: i32 = 118;

/// Version string reported by `/plugin_version` and `Query(PluginVersion)`
pub const PLUGIN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Marks an id, session or message number as unassigned
pub const INVALID_ID: i32 = -1;

/// Default port for both server and client settings
pub const DEFAULT_PORT: u16 = 8080;
