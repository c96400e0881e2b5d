use std::{
    thread,
    time::{Duration, Instant},
};

use meshsync_client::ClientSettings;
use meshsync_server::{Server, ServerSettings, ServerTimeouts};
use meshsync_shared::{Message, ResponseMessage};

/// A server on a free loopback port, driven by the test as its host
pub struct TestServer {
    pub server: Server,
    port: u16,
}

impl TestServer {
    pub fn start() -> Self {
        Self::start_with(ServerSettings::default())
    }

    pub fn start_with(settings: ServerSettings) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut server = Server::new(ServerSettings {
            port: 0,
            max_threads: 2,
            timeouts: ServerTimeouts {
                get: Duration::from_secs(5),
                query: Duration::from_secs(5),
                poll: Duration::from_millis(500),
                screenshot: Duration::from_millis(500),
            },
            ..settings
        });
        server.start().expect("test server should start");
        let port = server.local_addr().map_or(0, |addr| addr.port());
        Self { server, port }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            server: String::from("127.0.0.1"),
            port: self.port,
            timeout_ms: 10_000,
        }
    }

    /// Processes messages until `count` were handled or `timeout` passed,
    /// and returns copies of them in handling order.
    pub fn collect(&self, count: usize, timeout: Duration) -> Vec<Message> {
        self.collect_answering(count, timeout, |_| None)
    }

    pub fn collect_answering<F>(&self, count: usize, timeout: Duration, mut answer: F) -> Vec<Message>
    where
        F: FnMut(&Message) -> Option<ResponseMessage>,
    {
        let deadline = Instant::now() + timeout;
        let mut handled = Vec::new();
        while handled.len() < count && Instant::now() < deadline {
            self.server.process_messages(|message| {
                handled.push(message.clone());
                answer(message)
            });
            thread::sleep(Duration::from_millis(2));
        }
        handled
    }
}
