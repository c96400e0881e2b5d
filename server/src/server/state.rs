use std::{
    collections::VecDeque,
    mem,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, RwLock, TryLockError,
    },
};

use tokio::sync::{oneshot, watch};

use meshsync_shared::{
    Entity, FenceType, GetMessage, Identifier, Message, PollType, Pool, ResponseMessage, Scene,
    TextMessage, TextType, INVALID_ID,
};

use crate::{
    files::StaticFiles,
    server::{
        message_queue::{QueuedMessage, Reply, SceneFence},
        scene_conversion::export_scene,
        server_settings::ServerSettings,
    },
};

/// Request buffers kept for reuse
const BODY_POOL_CAPACITY: usize = 32;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A Get handed to the host, waiting for `end_serve_scene`
struct PendingGet {
    request: GetMessage,
    reply: oneshot::Sender<Scene>,
}

/// State shared between the connection tasks and the host thread.
/// No lock is held while the host handler runs, so the handler may call
/// back into the state.
pub(crate) struct ServerState {
    pub settings: ServerSettings,
    serving: AtomicBool,
    received: Mutex<Vec<QueuedMessage>>,
    /// Set and Delete waiting for their scene session, oldest first
    waiting: Mutex<VecDeque<QueuedMessage>>,
    fence: Mutex<SceneFence>,
    /// Held for the whole of `process_messages`
    processing: Mutex<()>,
    /// Bumped by `clear`
    generation: AtomicU64,
    /// Sets applied in the open scene session
    scene_cache: Mutex<Vec<Arc<Scene>>>,
    current_get: Mutex<Option<PendingGet>>,
    current_screenshot: Mutex<Option<oneshot::Sender<PathBuf>>>,
    /// Counts SceneUpdate notifications
    poll: watch::Sender<u64>,
    files: RwLock<StaticFiles>,
    pub body_pool: Arc<Pool<Vec<u8>>>,
}

impl ServerState {
    pub fn new(settings: ServerSettings) -> Self {
        let files = StaticFiles::new(settings.file_root_path.clone());
        let (poll, _) = watch::channel(0);
        Self {
            settings,
            serving: AtomicBool::new(true),
            received: Mutex::new(Vec::new()),
            waiting: Mutex::new(VecDeque::new()),
            fence: Mutex::new(SceneFence::default()),
            processing: Mutex::new(()),
            generation: AtomicU64::new(0),
            scene_cache: Mutex::new(Vec::new()),
            current_get: Mutex::new(None),
            current_screenshot: Mutex::new(None),
            poll,
            files: RwLock::new(files),
            body_pool: Pool::new(BODY_POOL_CAPACITY),
        }
    }

    pub fn is_serving(&self) -> bool {
        self.serving.load(Ordering::Acquire)
    }

    pub fn set_serve(&self, serve: bool) {
        self.serving.store(serve, Ordering::Release);
        if !serve {
            self.clear();
        }
    }

    pub fn files(&self) -> StaticFiles {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_file_root_path(&self, root: Option<PathBuf>) {
        *self.files.write().unwrap_or_else(PoisonError::into_inner) = StaticFiles::new(root);
    }

    pub fn queue(&self, queued: QueuedMessage) {
        lock(&self.received).push(queued);
    }

    pub fn queue_text(&self, text: &str, text_type: TextType) {
        self.queue(QueuedMessage::new(TextMessage::new(text, text_type)));
    }

    /// Messages received or waiting for their session. Messages taken by a
    /// running `process_messages` are not counted.
    pub fn queued_message_count(&self) -> usize {
        lock(&self.received).len() + lock(&self.waiting).len()
    }

    pub fn scene_session(&self) -> i32 {
        lock(&self.fence).session()
    }

    /// Admits `message` against the scene fence, returning whether it may be
    /// handled and the session that was open before it.
    fn admit(&self, message: &Message) -> (bool, i32) {
        let mut fence = lock(&self.fence);
        let session = fence.session();
        (fence.admit(message), session)
    }

    /// Hands received messages to `handler` in arrival order. Set and Delete
    /// outside the open scene session stay queued for a later call. Returns
    /// the number of messages handled. A call made while another is running,
    /// including one from inside the handler, handles nothing.
    pub fn process_messages<F>(&self, mut handler: F) -> usize
    where
        F: FnMut(&Message) -> Option<ResponseMessage>,
    {
        let _processing = match self.processing.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                log::warn!("process_messages is already running");
                return 0;
            }
        };
        let generation = self.generation.load(Ordering::Acquire);
        let mut messages = mem::take(&mut *lock(&self.waiting));
        messages.extend(lock(&self.received).drain(..));

        let mut handled = 0;
        let mut index = 0;
        while let Some(mut queued) = messages.remove(index) {
            if !queued.finish_import() {
                log::error!(
                    "scene import of session {} failed, message dropped",
                    queued.session_id()
                );
                continue;
            }
            let (admitted, session) = self.admit(&queued.message);
            if !admitted {
                log::trace!(
                    "{:?} of session {} skipped, open session is {}",
                    queued.message.kind(),
                    queued.session_id(),
                    session
                );
                messages.insert(index, queued);
                index += 1;
                continue;
            }
            self.dispatch(queued, &mut handler);
            handled += 1;
            if self.generation.load(Ordering::Acquire) != generation {
                log::debug!("state cleared by the handler, {} messages dropped", messages.len());
                return handled;
            }
            // skipped messages of a newly opened session are older than the rest
            if self.scene_session() != session {
                index = 0;
            }
        }

        if !messages.is_empty() {
            log::warn!(
                "{} messages wait for scene session {}",
                messages.len(),
                self.scene_session()
            );
            let mut waiting = lock(&self.waiting);
            messages.append(&mut waiting);
            *waiting = messages;
        }
        handled
    }

    fn dispatch<F>(&self, queued: QueuedMessage, handler: &mut F)
    where
        F: FnMut(&Message) -> Option<ResponseMessage>,
    {
        let (message, reply) = queued.into_parts();
        log::trace!("handling {:?}", message.kind());
        match (message, reply) {
            (Message::Get(request), Reply::Get(reply)) => {
                *lock(&self.current_get) = Some(PendingGet {
                    request: request.clone(),
                    reply,
                });
                handler(&Message::Get(request));
                if lock(&self.current_get).take().is_some() {
                    log::warn!("Get request finished without end_serve_scene");
                }
            }
            (Message::Set(set), _) => {
                let message = Message::Set(set);
                handler(&message);
                if let Message::Set(set) = message {
                    lock(&self.scene_cache).push(Arc::new(set.scene));
                }
            }
            (Message::Delete(delete), _) => {
                let message = Message::Delete(delete);
                handler(&message);
                if let Message::Delete(delete) = &message {
                    self.forget_session_entities(&delete.entities);
                }
            }
            (Message::Fence(fence), _) => {
                let scene_end = fence.fence_type == FenceType::SceneEnd;
                handler(&Message::Fence(fence));
                if scene_end {
                    lock(&self.scene_cache).clear();
                }
            }
            (message @ Message::Query(_), reply) => {
                let response = handler(&message).unwrap_or_default();
                if let Reply::Query(reply) = reply {
                    if reply.send(response).is_err() {
                        log::warn!("Query requester is gone");
                    }
                }
            }
            (message @ Message::Screenshot(_), reply) => {
                if let Reply::Screenshot(reply) = reply {
                    *lock(&self.current_screenshot) = Some(reply);
                }
                handler(&message);
            }
            (message, _) => {
                handler(&message);
            }
        }
    }

    pub fn current_get_request(&self) -> Option<GetMessage> {
        lock(&self.current_get)
            .as_ref()
            .map(|pending| pending.request.clone())
    }

    pub fn begin_serve_scene(&self) -> Option<Scene> {
        match lock(&self.current_get).as_ref() {
            Some(pending) => Some(Scene::new(pending.request.scene_settings.clone())),
            None => {
                log::error!("begin_serve_scene called outside a Get request");
                None
            }
        }
    }

    pub fn end_serve_scene(&self, mut scene: Scene) -> bool {
        let Some(pending) = lock(&self.current_get).take() else {
            log::error!("end_serve_scene called outside a Get request");
            return false;
        };
        export_scene(&mut scene, &pending.request);
        log::info!(
            "serving {} entities and {} assets",
            scene.entities.len(),
            scene.assets.len()
        );
        if pending.reply.send(scene).is_err() {
            log::warn!("Get requester is gone, scene dropped");
        }
        true
    }

    pub fn set_screenshot_file_path(&self, path: PathBuf) -> bool {
        match lock(&self.current_screenshot).take() {
            Some(reply) => reply.send(path).is_ok(),
            None => false,
        }
    }

    pub fn subscribe_poll(&self) -> watch::Receiver<u64> {
        self.poll.subscribe()
    }

    pub fn notify_poll(&self, poll_type: PollType) {
        match poll_type {
            PollType::SceneUpdate => self.poll.send_modify(|count| *count = count.wrapping_add(1)),
            PollType::Unknown => log::warn!("notify_poll called with an unknown poll type"),
        }
    }

    /// Latest entity with `path` among the Sets of the open scene session
    pub fn session_entity(&self, path: &str) -> Option<Arc<Entity>> {
        lock(&self.scene_cache)
            .iter()
            .rev()
            .find_map(|scene| scene.find_entity(path).cloned())
    }

    fn forget_session_entities(&self, deleted: &[Identifier]) {
        for scene in lock(&self.scene_cache).iter_mut() {
            Arc::make_mut(scene).entities.retain(|entity| {
                let identifier = entity.identifier();
                !deleted.iter().any(|gone| gone.matches(&identifier))
            });
        }
    }

    /// Drops every queued message and request waiting on the host.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        lock(&self.received).clear();
        lock(&self.waiting).clear();
        lock(&self.fence).reset();
        lock(&self.scene_cache).clear();
        lock(&self.current_get).take();
        lock(&self.current_screenshot).take();
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new(ServerSettings::default())
    }
}
