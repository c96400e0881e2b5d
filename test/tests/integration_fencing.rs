/// Scene session fencing observed through real HTTP requests.
use std::{sync::Arc, time::Duration};

use meshsync_client::{Client, ClientError};
use meshsync_shared::{
    DeleteMessage, FenceMessage, FenceType, Identifier, Message, MessageKind, Scene, SetMessage,
    TextType, Transform, PROTOCOL_VERSION,
};
use meshsync_test::TestServer;

const WAIT: Duration = Duration::from_secs(5);

fn fence(fence_type: FenceType, session_id: i32) -> FenceMessage {
    let mut message = FenceMessage::new(fence_type);
    message.header.session_id = session_id;
    message
}

fn set(session_id: i32, path: &str) -> SetMessage {
    let mut scene = Scene::default();
    scene.entities.push(Arc::new(Transform::new(path).into()));
    let mut message = SetMessage::new(scene);
    message.header.session_id = session_id;
    message
}

fn set_paths(messages: &[Message]) -> Vec<String> {
    messages
        .iter()
        .filter_map(|message| match message {
            Message::Set(set) => Some(set.scene.entities[0].path().to_string()),
            _ => None,
        })
        .collect()
}

#[test]
fn set_before_begin_waits_for_its_session() {
    let test = TestServer::start();
    let client = Client::new(test.client_settings()).unwrap();

    client.send_set(&set(5, "/early")).unwrap();
    assert!(test.collect(1, Duration::from_millis(200)).is_empty());
    assert_eq!(test.server.queued_message_count(), 1);

    client.send_fence(&fence(FenceType::SceneBegin, 5)).unwrap();
    client.send_set(&set(5, "/late")).unwrap();
    client.send_fence(&fence(FenceType::SceneEnd, 5)).unwrap();

    let messages = test.collect(4, WAIT);
    let kinds: Vec<MessageKind> = messages.iter().map(Message::kind).collect();
    assert_eq!(
        kinds,
        vec![MessageKind::Fence, MessageKind::Set, MessageKind::Set, MessageKind::Fence]
    );
    assert_eq!(set_paths(&messages), vec!["/early", "/late"]);
    assert_eq!(test.server.queued_message_count(), 0);
}

#[test]
fn overlapping_sessions_are_applied_one_after_another() {
    let test = TestServer::start();
    let client = Client::new(test.client_settings()).unwrap();

    client.send_fence(&fence(FenceType::SceneBegin, 1)).unwrap();
    client.send_fence(&fence(FenceType::SceneBegin, 2)).unwrap();
    client.send_set(&set(2, "/two")).unwrap();
    client.send_set(&set(1, "/one")).unwrap();
    client.send_fence(&fence(FenceType::SceneEnd, 1)).unwrap();
    client.send_fence(&fence(FenceType::SceneEnd, 2)).unwrap();

    let messages = test.collect(6, WAIT);
    assert_eq!(messages.len(), 6);
    assert_eq!(set_paths(&messages), vec!["/one", "/two"]);
    let sessions: Vec<i32> = messages.iter().map(Message::session_id).collect();
    assert_eq!(sessions, vec![1, 1, 1, 2, 2, 2]);
}

#[test]
fn delete_outside_session_stays_queued() {
    let test = TestServer::start();
    let client = Client::new(test.client_settings()).unwrap();

    let mut delete = DeleteMessage::default();
    delete.header.session_id = 9;
    delete.entities.push(Identifier::from_name("/gone"));
    client.send_delete(&delete).unwrap();

    assert!(test.collect(1, Duration::from_millis(200)).is_empty());
    assert_eq!(test.server.queued_message_count(), 1);
}

#[test]
fn foreign_protocol_version_is_rejected() {
    let test = TestServer::start();
    let client = Client::new(test.client_settings()).unwrap();

    let mut message = set(1, "/a");
    message.header.protocol_version = PROTOCOL_VERSION - 1;
    let result = client.send_set(&message);
    assert!(matches!(result, Err(ClientError::Status { status: 400 })));

    let messages = test.collect(1, WAIT);
    assert!(matches!(
        messages.first(),
        Some(Message::Text(text)) if text.text_type == TextType::Error
    ));
}
