use std::time::Duration;

use meshsync_shared::DEFAULT_PORT;

/// Where and how patiently a `Client` talks to its server
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientSettings {
    /// Host name or IP address of the server
    pub server: String,
    pub port: u16,
    /// Upper bound for one whole request, connect included
    pub timeout_ms: u64,
}

impl ClientSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub(crate) fn base_url(&self) -> String {
        format!("http://{}:{}", self.server, self.port)
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server: String::from("127.0.0.1"),
            port: DEFAULT_PORT,
            timeout_ms: 30_000,
        }
    }
}
