use reqwest::header::CONTENT_TYPE;
use tokio::runtime::{Builder, Runtime};

use meshsync_shared::{
    ByteReader, DeleteMessage, FenceMessage, GetMessage, MessageBody, PollMessage, PollType,
    ProtocolError, QueryMessage, ResponseMessage, Scene, Serde, SetMessage, TextMessage,
    PROTOCOL_VERSION,
};

use crate::{client_settings::ClientSettings, error::ClientError};

const OCTET_STREAM: &str = "application/octet-stream";

/// Blocking HTTP client of a MeshSync server. Each call is one request on a
/// fresh connection.
///
/// The client drives its own single-threaded runtime, so it must not be
/// used from inside another tokio runtime.
pub struct Client {
    settings: ClientSettings,
    http: reqwest::Client,
    runtime: Runtime,
    error_message: String,
}

impl Client {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let http = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(ClientError::Http)?;
        Ok(Self {
            settings,
            http,
            runtime,
            error_message: String::new(),
        })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Human readable reason of the last failed availability check
    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    /// Asks for the server's protocol version and compares it with ours
    pub fn is_server_available(&mut self) -> bool {
        let error_message = match self.check_protocol_version() {
            Ok(()) => {
                self.error_message.clear();
                return true;
            }
            Err(error @ ClientError::VersionMismatch { .. }) => {
                log::warn!("{}", error);
                String::from("Version doesn't match server.")
            }
            Err(ClientError::Timeout) => String::from("Could not reach server (timeout)."),
            Err(ClientError::Status { .. }) | Err(ClientError::Protocol(_)) => {
                String::from("Server is not working.")
            }
            Err(error) => error.to_string(),
        };
        self.error_message = format!(
            "{} [{}:{}]",
            error_message, self.settings.server, self.settings.port
        );
        false
    }

    fn check_protocol_version(&self) -> Result<(), ClientError> {
        let server = self.protocol_version()?;
        if server != PROTOCOL_VERSION {
            return Err(ClientError::VersionMismatch {
                server,
                client: PROTOCOL_VERSION,
            });
        }
        Ok(())
    }

    fn protocol_version(&self) -> Result<i32, ClientError> {
        let (status, body) = self.request(reqwest::Method::GET, "/protocol_version", None)?;
        if status != 200 {
            return Err(ClientError::Status { status });
        }
        String::from_utf8_lossy(&body)
            .trim()
            .parse()
            .map_err(|_| ClientError::Status { status })
    }

    // Messages

    /// Requests the host's scene, converted to the Get's settings
    pub fn send_get(&self, message: &GetMessage) -> Result<Scene, ClientError> {
        let body = self.post("/get", message)?;
        let mut reader = ByteReader::new(&body);
        Scene::de(&mut reader).map_err(|error| ProtocolError::from(error).into())
    }

    pub fn send_set(&self, message: &SetMessage) -> Result<(), ClientError> {
        self.post("/set", message).map(|_| ())
    }

    pub fn send_delete(&self, message: &DeleteMessage) -> Result<(), ClientError> {
        self.post("/delete", message).map(|_| ())
    }

    pub fn send_fence(&self, message: &FenceMessage) -> Result<(), ClientError> {
        self.post("/fence", message).map(|_| ())
    }

    /// Shows a line of text in the host's log
    pub fn send_text(&self, message: &TextMessage) -> Result<(), ClientError> {
        self.post("/text", message).map(|_| ())
    }

    pub fn send_query(&self, message: &QueryMessage) -> Result<ResponseMessage, ClientError> {
        let body = self.post("/query", message)?;
        Ok(ResponseMessage::decode(&body)?)
    }

    /// Waits for the host to signal `message.poll_type`. Returns false when
    /// the server gave up waiting.
    pub fn send_poll(&self, message: &PollMessage) -> Result<bool, ClientError> {
        let path = match message.poll_type {
            PollType::SceneUpdate => "/poll/scene_update",
            PollType::Unknown => "/poll",
        };
        match self.request(reqwest::Method::GET, path, None)? {
            (200, _) => Ok(true),
            (408, _) => Ok(false),
            (status, _) => Err(ClientError::Status { status }),
        }
    }

    fn post<M: MessageBody>(&self, path: &str, message: &M) -> Result<Vec<u8>, ClientError> {
        let (status, body) = self.request(reqwest::Method::POST, path, Some(message.encode()))?;
        if status != 200 {
            log::warn!("{} answered {}", path, status);
            return Err(ClientError::Status { status });
        }
        Ok(body)
    }

    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<(u16, Vec<u8>), ClientError> {
        let url = format!("{}{}", self.settings.base_url(), path);
        log::trace!("{} {}", method, url);
        self.runtime.block_on(async {
            let mut request = self.http.request(method, &url);
            if let Some(body) = body {
                request = request.header(CONTENT_TYPE, OCTET_STREAM).body(body);
            }
            let response = request.send().await.map_err(ClientError::from_request)?;
            let status = response.status().as_u16();
            let body = response
                .bytes()
                .await
                .map_err(ClientError::from_request)?;
            Ok((status, body.to_vec()))
        })
    }
}
