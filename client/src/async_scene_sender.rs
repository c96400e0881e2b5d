use std::{
    mem,
    panic,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    thread::{self, JoinHandle},
};

use meshsync_shared::{
    DeleteMessage, FenceMessage, FenceType, MessageHeader, Scene, SetMessage, INVALID_ID,
};

use crate::{
    client::Client, client_settings::ClientSettings, error::ClientError, id_table::IdTable,
    scene_batch::SceneBatch, scene_transport::SceneTransport,
};

type Callback = Box<dyn FnMut() + Send>;
type PrepareCallback = Box<dyn FnMut(&mut SceneBatch) + Send>;
type ErrorCallback = Box<dyn FnMut(&ClientError) + Send>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Sends a `SceneBatch` as one fenced scene session on a background thread.
///
/// Per send the order is: SceneBegin, assets, each texture, materials with
/// the non-geometry entities, each geometry, animations, deletions, SceneEnd.
/// The first failed message aborts the rest; whatever was already sent stays
/// applied on the server.
pub struct AsyncSceneSender {
    /// Data for the next `kick`
    pub batch: SceneBatch,
    client_settings: ClientSettings,
    worker: Arc<Mutex<SendWorker>>,
    error_message: Arc<Mutex<String>>,
    task: Option<JoinHandle<()>>,
}

impl AsyncSceneSender {
    /// A sender talking HTTP to the server in `client_settings`. An invalid
    /// `session_id` picks a random one.
    pub fn new(session_id: i32, client_settings: ClientSettings) -> Result<Self, ClientError> {
        let client = Client::new(client_settings.clone())?;
        Ok(Self::with_transport(session_id, client_settings, client))
    }

    pub fn with_transport(
        session_id: i32,
        client_settings: ClientSettings,
        transport: impl SceneTransport + 'static,
    ) -> Self {
        let session_id = if session_id == INVALID_ID {
            fastrand::i32(0..=0x7000_0000)
        } else {
            session_id
        };
        Self {
            batch: SceneBatch::default(),
            client_settings,
            worker: Arc::new(Mutex::new(SendWorker::new(session_id, Box::new(transport)))),
            error_message: Arc::new(Mutex::new(String::new())),
            task: None,
        }
    }

    pub fn session_id(&self) -> i32 {
        lock(&self.worker).session_id
    }

    pub fn client_settings(&self) -> &ClientSettings {
        &self.client_settings
    }

    // Callbacks. Registering one waits for a send in flight.

    /// Runs on the sending thread before anything is sent, and may fill the
    /// batch. An empty batch afterwards cancels the send.
    pub fn on_prepare(&mut self, callback: impl FnMut(&mut SceneBatch) + Send + 'static) {
        lock(&self.worker).on_prepare = Some(Box::new(callback));
    }

    /// Runs once the batch is known to be non-empty
    pub fn on_before_send(&mut self, callback: impl FnMut() + Send + 'static) {
        lock(&self.worker).on_before_send = Some(Box::new(callback));
    }

    /// Runs after SceneEnd was delivered. Dirty flags should be cleared here.
    pub fn on_success(&mut self, callback: impl FnMut() + Send + 'static) {
        lock(&self.worker).on_success = Some(Box::new(callback));
    }

    pub fn on_error(&mut self, callback: impl FnMut(&ClientError) + Send + 'static) {
        lock(&self.worker).on_error = Some(Box::new(callback));
    }

    /// Runs after every non-empty send, successful or not
    pub fn on_complete(&mut self, callback: impl FnMut() + Send + 'static) {
        lock(&self.worker).on_complete = Some(Box::new(callback));
    }

    // Sending

    /// Starts sending the pending batch. Waits for the previous send first,
    /// so at most one is in flight.
    pub fn kick(&mut self) {
        self.wait();

        let next = SceneBatch {
            scene_settings: self.batch.scene_settings.clone(),
            ..SceneBatch::default()
        };
        let batch = mem::replace(&mut self.batch, next);
        let worker = self.worker.clone();
        let error_message = self.error_message.clone();

        let spawned = thread::Builder::new()
            .name(String::from("meshsync-sender"))
            .spawn(move || {
                let outcome = lock(&worker).send(batch);
                match outcome {
                    Some(Ok(())) => lock(&error_message).clear(),
                    Some(Err(error)) => {
                        log::warn!("scene send failed: {}", error);
                        *lock(&error_message) = error.to_string();
                    }
                    None => log::trace!("nothing to send"),
                }
            });
        match spawned {
            Ok(task) => self.task = Some(task),
            Err(error) => {
                log::error!("Failed to spawn scene sender thread: {}", error);
                *lock(&self.error_message) = error.to_string();
            }
        }
    }

    /// Blocks until the send in flight, if any, has finished. A panic in a
    /// callback is resumed here.
    pub fn wait(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(payload) = task.join() {
                panic::resume_unwind(payload);
            }
        }
    }

    pub fn is_sending(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Checks the server in `client_settings` and records why it isn't usable
    pub fn is_server_available(&mut self) -> bool {
        let (available, message) = match Client::new(self.client_settings.clone()) {
            Ok(mut client) => {
                let available = client.is_server_available();
                (available, client.error_message().to_string())
            }
            Err(error) => (false, error.to_string()),
        };
        *lock(&self.error_message) = message;
        available
    }

    /// Reason of the last failed send or availability check
    pub fn error_message(&self) -> String {
        lock(&self.error_message).clone()
    }
}

impl Drop for AsyncSceneSender {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            if task.join().is_err() {
                log::error!("scene sender thread panicked");
            }
        }
    }
}

struct SendWorker {
    transport: Box<dyn SceneTransport>,
    session_id: i32,
    message_count: i32,
    id_table: IdTable<String>,
    on_prepare: Option<PrepareCallback>,
    on_before_send: Option<Callback>,
    on_success: Option<Callback>,
    on_error: Option<ErrorCallback>,
    on_complete: Option<Callback>,
}

impl SendWorker {
    fn new(session_id: i32, transport: Box<dyn SceneTransport>) -> Self {
        Self {
            transport,
            session_id,
            message_count: 0,
            id_table: IdTable::new(),
            on_prepare: None,
            on_before_send: None,
            on_success: None,
            on_error: None,
            on_complete: None,
        }
    }

    /// None when there was nothing to send
    fn send(&mut self, mut batch: SceneBatch) -> Option<Result<(), ClientError>> {
        if let Some(on_prepare) = self.on_prepare.as_mut() {
            on_prepare(&mut batch);
        }
        if batch.is_empty() {
            return None;
        }
        if let Some(on_before_send) = self.on_before_send.as_mut() {
            on_before_send();
        }

        self.prepare_entities(&mut batch);
        let result = self.send_session(&batch);

        match &result {
            Ok(()) => {
                if let Some(on_success) = self.on_success.as_mut() {
                    on_success();
                }
            }
            Err(error) => {
                if let Some(on_error) = self.on_error.as_mut() {
                    on_error(error);
                }
            }
        }
        if let Some(on_complete) = self.on_complete.as_mut() {
            on_complete();
        }
        Some(result)
    }

    /// Fills mesh data flags, gives every unnumbered entity the id of its
    /// path and restores first-seen order.
    fn prepare_entities(&mut self, batch: &mut SceneBatch) {
        for entity in batch.transforms.iter_mut().chain(batch.geometries.iter_mut()) {
            let entity = Arc::make_mut(entity);
            if let Some(mesh) = entity.as_mesh_mut() {
                mesh.setup_data_flags();
            }
            let transform = entity.transform_mut();
            if transform.id == INVALID_ID {
                transform.id = self.id_table.id_of(transform.path.clone());
            }
        }
        batch.transforms.sort_by_key(|entity| entity.transform().order);
        batch.geometries.sort_by_key(|entity| entity.transform().order);
    }

    fn next_header(&mut self) -> MessageHeader {
        let message_id = self.message_count;
        self.message_count += 1;
        MessageHeader::new(self.session_id, message_id)
    }

    fn send_fence(&mut self, fence_type: FenceType) -> Result<(), ClientError> {
        let mut message = FenceMessage::new(fence_type);
        message.header = self.next_header();
        self.transport.send_fence(&message)
    }

    fn send_scene(&mut self, scene: Scene) -> Result<(), ClientError> {
        let mut message = SetMessage::new(scene);
        message.header = self.next_header();
        self.transport.send_set(&message)
    }

    fn send_session(&mut self, batch: &SceneBatch) -> Result<(), ClientError> {
        let settings = &batch.scene_settings;
        self.send_fence(FenceType::SceneBegin)?;

        if !batch.assets.is_empty() {
            let mut scene = Scene::new(settings.clone());
            scene.assets = batch.assets.clone();
            self.send_scene(scene)?;
        }

        for texture in &batch.textures {
            let mut scene = Scene::new(settings.clone());
            scene.assets.push(texture.clone());
            self.send_scene(scene)?;
        }

        if !batch.materials.is_empty() || !batch.transforms.is_empty() {
            let mut scene = Scene::new(settings.clone());
            scene.assets = batch.materials.clone();
            scene.entities = batch.transforms.clone();
            self.send_scene(scene)?;
        }

        for geometry in &batch.geometries {
            let mut scene = Scene::new(settings.clone());
            scene.entities.push(geometry.clone());
            self.send_scene(scene)?;
        }

        if !batch.animations.is_empty() {
            let mut scene = Scene::new(settings.clone());
            scene.assets = batch.animations.clone();
            self.send_scene(scene)?;
        }

        if !batch.deleted_entities.is_empty() || !batch.deleted_materials.is_empty() {
            let message = DeleteMessage {
                header: self.next_header(),
                entities: batch.deleted_entities.clone(),
                materials: batch.deleted_materials.clone(),
            };
            self.transport.send_delete(&message)?;
        }

        self.send_fence(FenceType::SceneEnd)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use meshsync_shared::{Asset, FileAsset, Identifier, Mesh, MessageKind, Transform};

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Sent {
        kind: MessageKind,
        session_id: i32,
        message_id: i32,
        entities: Vec<(String, i32)>,
        assets: usize,
    }

    #[derive(Clone, Default)]
    struct RecordingTransport {
        sent: Arc<Mutex<Vec<Sent>>>,
        fail_at: Option<usize>,
    }

    impl RecordingTransport {
        fn record(
            &mut self,
            kind: MessageKind,
            header: &MessageHeader,
            scene: Option<&Scene>,
        ) -> Result<(), ClientError> {
            let mut sent = self.sent.lock().unwrap();
            if self.fail_at == Some(sent.len()) {
                return Err(ClientError::Status { status: 500 });
            }
            sent.push(Sent {
                kind,
                session_id: header.session_id,
                message_id: header.message_id,
                entities: scene
                    .map(|scene| {
                        scene
                            .entities
                            .iter()
                            .map(|entity| (entity.path().to_string(), entity.transform().id))
                            .collect()
                    })
                    .unwrap_or_default(),
                assets: scene.map_or(0, |scene| scene.assets.len()),
            });
            Ok(())
        }

        fn kinds(&self) -> Vec<MessageKind> {
            self.sent.lock().unwrap().iter().map(|sent| sent.kind).collect()
        }
    }

    impl SceneTransport for RecordingTransport {
        fn send_fence(&mut self, message: &FenceMessage) -> Result<(), ClientError> {
            self.record(MessageKind::Fence, &message.header, None)
        }

        fn send_set(&mut self, message: &SetMessage) -> Result<(), ClientError> {
            self.record(MessageKind::Set, &message.header, Some(&message.scene))
        }

        fn send_delete(&mut self, message: &DeleteMessage) -> Result<(), ClientError> {
            self.record(MessageKind::Delete, &message.header, None)
        }
    }

    fn file() -> Arc<Asset> {
        Arc::new(Asset::File(FileAsset::default()))
    }

    fn transform(path: &str, order: u32) -> Arc<meshsync_shared::Entity> {
        let mut transform = Transform::new(path);
        transform.order = order;
        Arc::new(transform.into())
    }

    fn sender(transport: &RecordingTransport) -> AsyncSceneSender {
        AsyncSceneSender::with_transport(42, ClientSettings::default(), transport.clone())
    }

    #[test]
    fn full_batch_is_sent_in_session_order() {
        let transport = RecordingTransport::default();
        let mut sender = sender(&transport);
        sender.batch.assets.push(file());
        sender.batch.textures = vec![file(), file()];
        sender.batch.materials.push(file());
        sender.batch.transforms = vec![transform("/b", 1), transform("/a", 0)];
        sender.batch.geometries = vec![
            Arc::new(Mesh::new("/mesh0").into()),
            Arc::new(Mesh::new("/mesh1").into()),
        ];
        sender.batch.animations.push(file());
        sender.batch.deleted_entities.push(Identifier::from_name("/gone"));
        sender.kick();
        sender.wait();

        use MessageKind::*;
        assert_eq!(
            transport.kinds(),
            vec![Fence, Set, Set, Set, Set, Set, Set, Set, Delete, Fence]
        );
        let sent = transport.sent.lock().unwrap();
        assert!(sent.iter().all(|sent| sent.session_id == 42));
        let ids: Vec<i32> = sent.iter().map(|sent| sent.message_id).collect();
        assert_eq!(ids, (0..10).collect::<Vec<_>>());
        assert_eq!(sent[4].assets, 1);
        assert_eq!(
            sent[4].entities,
            vec![(String::from("/a"), 1), (String::from("/b"), 0)]
        );
        assert_eq!(sent[5].entities[0].0, "/mesh0");
        assert!(sender.batch.is_empty());
        assert!(sender.error_message().is_empty());
    }

    #[test]
    fn empty_batch_sends_nothing() {
        let transport = RecordingTransport::default();
        let mut sender = sender(&transport);
        let completed = Arc::new(AtomicUsize::new(0));
        let counter = completed.clone();
        sender.on_complete(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        sender.kick();
        sender.wait();
        assert!(transport.kinds().is_empty());
        assert_eq!(completed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn prepare_fills_the_batch_on_the_sending_thread() {
        let transport = RecordingTransport::default();
        let mut sender = sender(&transport);
        sender.on_prepare(|batch| batch.transforms.push(transform("/late", 0)));
        sender.kick();
        sender.wait();
        assert_eq!(
            transport.kinds(),
            vec![MessageKind::Fence, MessageKind::Set, MessageKind::Fence]
        );
    }

    #[test]
    fn failure_aborts_the_session() {
        let transport = RecordingTransport {
            fail_at: Some(2),
            ..RecordingTransport::default()
        };
        let mut sender = sender(&transport);
        let succeeded = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));
        let completed = Arc::new(AtomicUsize::new(0));
        {
            let succeeded = succeeded.clone();
            sender.on_success(move || {
                succeeded.fetch_add(1, Ordering::SeqCst);
            });
            let failed = failed.clone();
            sender.on_error(move |error| {
                assert!(matches!(error, ClientError::Status { status: 500 }));
                failed.fetch_add(1, Ordering::SeqCst);
            });
            let completed = completed.clone();
            sender.on_complete(move || {
                completed.fetch_add(1, Ordering::SeqCst);
            });
        }
        sender.batch.geometries = vec![
            Arc::new(Mesh::new("/m0").into()),
            Arc::new(Mesh::new("/m1").into()),
            Arc::new(Mesh::new("/m2").into()),
        ];
        sender.kick();
        sender.wait();

        assert_eq!(transport.kinds().len(), 2);
        assert_eq!(succeeded.load(Ordering::SeqCst), 0);
        assert_eq!(failed.load(Ordering::SeqCst), 1);
        assert_eq!(completed.load(Ordering::SeqCst), 1);
        assert!(!sender.error_message().is_empty());
    }

    #[test]
    fn ids_and_message_numbers_carry_across_kicks() {
        let transport = RecordingTransport::default();
        let mut sender = sender(&transport);
        sender.batch.transforms = vec![transform("/x", 0), transform("/y", 1)];
        sender.kick();
        sender.batch.transforms = vec![transform("/y", 1)];
        sender.kick();
        sender.wait();

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 6);
        assert_eq!(sent[1].entities[1], (String::from("/y"), 1));
        assert_eq!(sent[4].entities[0], (String::from("/y"), 1));
        assert_eq!(sent[5].message_id, 5);
    }

    #[test]
    fn invalid_session_id_is_randomized() {
        let transport = RecordingTransport::default();
        let sender =
            AsyncSceneSender::with_transport(INVALID_ID, ClientSettings::default(), transport);
        assert!((0..=0x7000_0000).contains(&sender.session_id()));
    }
}
