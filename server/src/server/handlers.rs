use std::{
    panic::{self, AssertUnwindSafe},
    path::PathBuf,
    sync::mpsc,
};

use http::{
    header::{CACHE_CONTROL, CONTENT_TYPE},
    HeaderValue, Method, Request, Response, StatusCode,
};
use tokio::{sync::oneshot, time::timeout};

use meshsync_shared::{
    ByteWriter, DeleteMessage, FenceMessage, GetMessage, Message, MessageBody, MessageHeader,
    Pooled, QueryMessage, QueryType, ResponseMessage, Scene, Serde, SetMessage, TextMessage,
    TextType, PLUGIN_VERSION, PROTOCOL_VERSION,
};

use crate::{
    server::{
        message_queue::{QueuedMessage, Reply},
        scene_conversion::import_scene,
        state::ServerState,
    },
    transport::http::{binary_response, respond, text_response},
};

const OCTET_STREAM: &str = "application/octet-stream";

fn encode_scene(scene: &Scene) -> Vec<u8> {
    let mut writer = ByteWriter::with_capacity(scene.byte_length());
    scene.ser(&mut writer);
    writer.to_bytes()
}

fn text_param(form: &[u8]) -> Option<String> {
    url::form_urlencoded::parse(form)
        .find(|(key, _)| key == "t")
        .map(|(_, value)| value.into_owned())
}

impl ServerState {
    /// Routes one request by URI.
    pub(crate) async fn handle_request(
        &self,
        request: Request<Pooled<Vec<u8>>>,
    ) -> Response<Vec<u8>> {
        if !self.is_serving() {
            return text_response(StatusCode::SERVICE_UNAVAILABLE, "");
        }

        let path = request.uri().path().to_string();
        log::trace!("{} {}", request.method(), path);
        match path.as_str() {
            "/set" => self.recv_set(request.body()),
            "/delete" => self.recv_queued::<DeleteMessage>(request.body()),
            "/fence" => self.recv_queued::<FenceMessage>(request.body()),
            "/get" => self.recv_get(request.body()).await,
            "/query" => self.recv_query(request.body()).await,
            path if path.starts_with("/text") => self.recv_text(&request).await,
            path if path.starts_with("/screenshot") => self.recv_screenshot().await,
            path if path.starts_with("/poll") => self.recv_poll(path).await,
            path if path.starts_with("/protocol_version") => {
                text_response(StatusCode::OK, &PROTOCOL_VERSION.to_string())
            }
            path if path.starts_with("/plugin_version") => {
                text_response(StatusCode::OK, PLUGIN_VERSION)
            }
            path => self.files().serve(path).await,
        }
    }

    /// Decodes a message body. Failures are queued as an error text for the
    /// host and answered with 400.
    fn decode<M: MessageBody>(&self, body: &[u8]) -> Result<M, Response<Vec<u8>>> {
        M::decode(body).map_err(|error| {
            let text = error.to_string();
            log::warn!("rejected {:?} request: {}", M::KIND, text);
            self.queue_text(&text, TextType::Error);
            text_response(StatusCode::BAD_REQUEST, &text)
        })
    }

    fn recv_queued<M: MessageBody + Into<Message>>(&self, body: &[u8]) -> Response<Vec<u8>> {
        match self.decode::<M>(body) {
            Ok(message) => {
                self.queue(QueuedMessage::new(message));
                text_response(StatusCode::OK, "ok")
            }
            Err(response) => response,
        }
    }

    /// Queues the Set right away and converts its scene on the thread pool.
    fn recv_set(&self, body: &[u8]) -> Response<Vec<u8>> {
        let set: SetMessage = match self.decode(body) {
            Ok(set) => set,
            Err(response) => return response,
        };
        let header = set.header.clone();
        let split_unit = self.settings.mesh_split_unit;
        let max_bone_influence = self.settings.mesh_max_bone_influence;
        let (sender, receiver) = mpsc::sync_channel(1);
        rayon::spawn(move || {
            let mut scene = set.scene;
            let imported = panic::catch_unwind(AssertUnwindSafe(|| {
                import_scene(&mut scene, split_unit, max_bone_influence);
            }));
            match imported {
                Ok(()) => {
                    let _ = sender.send(scene);
                }
                Err(_) => log::error!("scene import panicked"),
            }
        });
        self.queue(QueuedMessage::importing(header, receiver));
        text_response(StatusCode::OK, "ok")
    }

    async fn recv_get(&self, body: &[u8]) -> Response<Vec<u8>> {
        let get: GetMessage = match self.decode(body) {
            Ok(get) => get,
            Err(response) => return response,
        };
        let (sender, receiver) = oneshot::channel();
        self.queue(QueuedMessage::with_reply(get, Reply::Get(sender)));

        let scene = match timeout(self.settings.timeouts.get, receiver).await {
            Ok(Ok(scene)) => scene,
            Ok(Err(_)) => {
                log::warn!("Get was handled without a served scene");
                Scene::default()
            }
            Err(_) => {
                log::warn!("Get timed out after {:?}", self.settings.timeouts.get);
                Scene::default()
            }
        };
        binary_response(encode_scene(&scene))
    }

    async fn recv_query(&self, body: &[u8]) -> Response<Vec<u8>> {
        let query: QueryMessage = match self.decode(body) {
            Ok(query) => query,
            Err(response) => return response,
        };
        let header = MessageHeader::new(query.header.session_id, query.header.message_id);

        let mut response = match query.query_type {
            QueryType::PluginVersion => {
                let mut response = ResponseMessage::default();
                response.text.push(PLUGIN_VERSION.to_string());
                response
            }
            QueryType::ProtocolVersion => {
                let mut response = ResponseMessage::default();
                response.text.push(PROTOCOL_VERSION.to_string());
                response
            }
            _ => {
                let (sender, receiver) = oneshot::channel();
                self.queue(QueuedMessage::with_reply(query, Reply::Query(sender)));
                match timeout(self.settings.timeouts.query, receiver).await {
                    Ok(Ok(response)) => response,
                    _ => {
                        log::warn!("Query got no answer from the host");
                        ResponseMessage::default()
                    }
                }
            }
        };
        response.header = header;
        binary_response(response.encode())
    }

    /// Serialized TextMessages arrive as octet streams. Browsers send a
    /// `t=` form, by query string or body, and get the index page back.
    async fn recv_text(&self, request: &Request<Pooled<Vec<u8>>>) -> Response<Vec<u8>> {
        let is_message = request
            .headers()
            .get(CONTENT_TYPE)
            .is_some_and(|value| value.as_bytes().starts_with(OCTET_STREAM.as_bytes()));
        if is_message {
            let text: TextMessage = match self.decode(request.body()) {
                Ok(text) => text,
                Err(response) => return response,
            };
            if !text.text.is_empty() {
                self.queue(QueuedMessage::new(text));
            }
            return text_response(StatusCode::OK, "ok");
        }

        let text = if request.method() == Method::GET {
            request
                .uri()
                .query()
                .and_then(|query| text_param(query.as_bytes()))
        } else {
            let body: &[u8] = request.body();
            text_param(body).or_else(|| Some(String::from_utf8_lossy(body).into_owned()))
        };
        if let Some(text) = text.filter(|text| !text.is_empty()) {
            self.queue_text(&text, TextType::Normal);
        }
        self.files().serve("").await
    }

    async fn recv_screenshot(&self) -> Response<Vec<u8>> {
        let (sender, receiver) = oneshot::channel::<PathBuf>();
        self.queue(QueuedMessage::with_reply(
            meshsync_shared::ScreenshotMessage::default(),
            Reply::Screenshot(sender),
        ));

        let Ok(Ok(path)) = timeout(self.settings.timeouts.screenshot, receiver).await else {
            log::warn!("screenshot was not taken in time");
            return text_response(StatusCode::NOT_FOUND, "");
        };
        match tokio::fs::read(&path).await {
            Ok(data) => {
                let content_type = HeaderValue::from_static("image/png");
                let mut response = respond(StatusCode::OK, content_type, data);
                response.headers_mut().insert(
                    CACHE_CONTROL,
                    HeaderValue::from_static("no-store, must-revalidate"),
                );
                response
            }
            Err(error) => {
                log::warn!("screenshot {} unreadable: {}", path.display(), error);
                text_response(StatusCode::NOT_FOUND, "")
            }
        }
    }

    async fn recv_poll(&self, path: &str) -> Response<Vec<u8>> {
        if path != "/poll" && path != "/poll/scene_update" {
            return text_response(StatusCode::BAD_REQUEST, "");
        }
        let mut updates = self.subscribe_poll();
        match timeout(self.settings.timeouts.poll, updates.changed()).await {
            Ok(Ok(())) => text_response(StatusCode::OK, "ok"),
            _ => text_response(StatusCode::REQUEST_TIMEOUT, "timeout"),
        }
    }
}
