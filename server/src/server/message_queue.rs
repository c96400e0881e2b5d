use std::{path::PathBuf, sync::mpsc};

use tokio::sync::oneshot;

use meshsync_shared::{
    FenceType, Message, MessageHeader, ResponseMessage, Scene, SetMessage, INVALID_ID,
};

/// Where the result of handling a message goes, if a request is waiting on it
pub(crate) enum Reply {
    None,
    Get(oneshot::Sender<Scene>),
    Query(oneshot::Sender<ResponseMessage>),
    Screenshot(oneshot::Sender<PathBuf>),
}

/// A received message waiting for `process_messages`
pub(crate) struct QueuedMessage {
    pub message: Message,
    /// Pending conversion of a Set's scene
    import: Option<mpsc::Receiver<Scene>>,
    reply: Reply,
}

impl QueuedMessage {
    pub fn new(message: impl Into<Message>) -> Self {
        Self::with_reply(message, Reply::None)
    }

    pub fn with_reply(message: impl Into<Message>, reply: Reply) -> Self {
        Self {
            message: message.into(),
            import: None,
            reply,
        }
    }

    /// A Set whose scene is still being converted on the thread pool
    pub fn importing(header: MessageHeader, import: mpsc::Receiver<Scene>) -> Self {
        let mut message = SetMessage::default();
        message.header = header;
        Self {
            message: Message::Set(message),
            import: Some(import),
            reply: Reply::None,
        }
    }

    pub fn session_id(&self) -> i32 {
        self.message.session_id()
    }

    pub fn into_parts(self) -> (Message, Reply) {
        (self.message, self.reply)
    }

    /// Blocks until a pending import is done. Returns false when the import
    /// task died without producing a scene.
    pub fn finish_import(&mut self) -> bool {
        let Some(import) = self.import.take() else {
            return true;
        };
        match import.recv() {
            Ok(scene) => {
                if let Message::Set(set) = &mut self.message {
                    set.scene = scene;
                }
                true
            }
            Err(_) => false,
        }
    }
}

/// Scene-session fencing. Set and Delete are only admitted for the session
/// opened by the last accepted SceneBegin, or when no session is open and they
/// carry no session either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SceneFence {
    session: i32,
}

impl Default for SceneFence {
    fn default() -> Self {
        Self {
            session: INVALID_ID,
        }
    }
}

impl SceneFence {
    pub fn session(&self) -> i32 {
        self.session
    }

    /// Whether `message` may be handled now. Accepting a fence moves the
    /// session, a rejected message is skipped and retried on the next pass.
    pub fn admit(&mut self, message: &Message) -> bool {
        match message {
            Message::Set(_) | Message::Delete(_) => message.session_id() == self.session,
            Message::Fence(fence) => match fence.fence_type {
                FenceType::SceneBegin if self.session == INVALID_ID => {
                    self.session = fence.header.session_id;
                    true
                }
                FenceType::SceneEnd if self.session == fence.header.session_id => {
                    self.session = INVALID_ID;
                    true
                }
                FenceType::SceneBegin | FenceType::SceneEnd => false,
                FenceType::Unknown => true,
            },
            _ => true,
        }
    }

    pub fn reset(&mut self) {
        self.session = INVALID_ID;
    }
}
