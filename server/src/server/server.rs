use std::{
    net::SocketAddr,
    path::PathBuf,
    sync::Arc,
};

use meshsync_shared::{Entity, GetMessage, Message, PollType, ResponseMessage, Scene};

use crate::{
    server::{server_settings::ServerSettings, state::ServerState},
    transport::Listener,
    ServerError,
};

/// An HTTP server that receives scenes from a content tool, queues them until
/// the host application calls `process_messages`, and serves the host's scene
/// back on request
pub struct Server {
    state: Arc<ServerState>,
    listener: Option<Listener>,
}

impl Server {
    /// Create a new Server. Nothing is bound until `start`.
    pub fn new(settings: ServerSettings) -> Self {
        Self {
            state: Arc::new(ServerState::new(settings)),
            listener: None,
        }
    }

    /// Binds the configured port and starts serving requests
    pub fn start(&mut self) -> Result<(), ServerError> {
        if self.listener.is_some() {
            return Err(ServerError::AlreadyRunning);
        }
        self.listener = Some(Listener::spawn(self.state.clone())?);
        Ok(())
    }

    /// Stops accepting connections. Queued messages are kept.
    pub fn stop(&mut self) {
        if let Some(mut listener) = self.listener.take() {
            listener.stop();
        }
    }

    pub fn is_running(&self) -> bool {
        self.listener.is_some()
    }

    /// Address actually bound, useful when the configured port is 0
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().map(Listener::local_addr)
    }

    pub fn settings(&self) -> &ServerSettings {
        &self.state.settings
    }

    /// While not serving, every request is answered with 503. Turning
    /// serving off drops everything queued.
    pub fn set_serve(&self, serve: bool) {
        self.state.set_serve(serve);
    }

    pub fn is_serving(&self) -> bool {
        self.state.is_serving()
    }

    /// Changes the static file root and reloads its `mimetypes.txt`
    pub fn set_file_root_path(&self, root: impl Into<PathBuf>) {
        self.state.set_file_root_path(Some(root.into()));
    }

    pub fn file_root_path(&self) -> Option<PathBuf> {
        self.state.files().root().map(PathBuf::from)
    }

    // Messages

    /// Messages received but not handled yet, including ones skipped
    /// while waiting for their scene session
    pub fn queued_message_count(&self) -> usize {
        self.state.queued_message_count()
    }

    /// Must be called regularly from the host thread. Hands every received
    /// message that its scene session allows to `handler`, in arrival order.
    /// The handler's return value answers a Query. Returns the number of
    /// messages handled.
    pub fn process_messages<F>(&self, handler: F) -> usize
    where
        F: FnMut(&Message) -> Option<ResponseMessage>,
    {
        self.state.process_messages(handler)
    }

    /// Session id opened by the last accepted SceneBegin fence
    pub fn scene_session(&self) -> i32 {
        self.state.scene_session()
    }

    /// Looks up an entity among the Sets applied in the open scene session
    pub fn session_entity(&self, path: &str) -> Option<Arc<Entity>> {
        self.state.session_entity(path)
    }

    /// Drops every queued message and pending request
    pub fn clear(&self) {
        self.state.clear();
    }

    // Serving

    /// The Get being handled, for its flags and settings
    pub fn current_get_request(&self) -> Option<GetMessage> {
        self.state.current_get_request()
    }

    /// Starts answering the Get being handled. Returns an empty scene
    /// carrying the requester's settings, or None outside a Get.
    pub fn begin_serve_scene(&self) -> Option<Scene> {
        self.state.begin_serve_scene()
    }

    /// Converts `scene` into the requester's convention, refines its meshes
    /// and sends it. Returns false outside a Get.
    pub fn end_serve_scene(&self, scene: Scene) -> bool {
        self.state.end_serve_scene(scene)
    }

    /// Completes the pending screenshot request with an image file
    pub fn set_screenshot_file_path(&self, path: impl Into<PathBuf>) -> bool {
        self.state.set_screenshot_file_path(path.into())
    }

    /// Wakes every poll request waiting on `poll_type`
    pub fn notify_poll(&self, poll_type: PollType) {
        self.state.notify_poll(poll_type);
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.stop();
        self.state.clear();
    }
}
