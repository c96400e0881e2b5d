/// Client and server talking over a real loopback socket, with the test
/// acting as the host application.
use std::{thread, time::Duration};

use glam::Vec3;

use meshsync_client::{AsyncSceneSender, Client};
use meshsync_shared::{
    FenceType, GetMessage, Handedness, Identifier, Message, PollMessage, PollType, QueryMessage,
    QueryType, ResponseMessage, TextMessage, TextType,
};
use meshsync_test::{quad_grid, transform_at, TestServer};

const WAIT: Duration = Duration::from_secs(5);

#[test]
fn async_sender_session_reaches_host_converted() {
    let test = TestServer::start();
    let mut sender = AsyncSceneSender::new(7, test.client_settings()).unwrap();
    sender.batch.scene_settings.handedness = Handedness::Right;
    sender.batch.scene_settings.scale_factor = 100.0;
    sender
        .batch
        .transforms
        .push(std::sync::Arc::new(transform_at("/root", Vec3::new(100.0, 50.0, 0.0)).into()));
    sender
        .batch
        .geometries
        .push(std::sync::Arc::new(quad_grid("/root/grid", 2, 2).into()));
    sender.batch.deleted_entities.push(Identifier::from_name("/old"));
    sender.kick();
    sender.wait();
    assert!(sender.error_message().is_empty(), "{}", sender.error_message());

    let messages = test.collect(5, WAIT);
    assert_eq!(messages.len(), 5);
    assert!(matches!(&messages[0], Message::Fence(f) if f.fence_type == FenceType::SceneBegin));
    assert!(matches!(&messages[4], Message::Fence(f) if f.fence_type == FenceType::SceneEnd));
    assert!(messages.iter().all(|message| message.session_id() == 7));

    let Message::Set(transforms) = &messages[1] else {
        panic!("expected the transform set, got {:?}", messages[1].kind());
    };
    let root = transforms.scene.entities[0].transform();
    assert_eq!(root.position, Vec3::new(-1.0, 0.5, 0.0));
    assert_eq!(root.id, 0);
    assert_eq!(transforms.scene.settings.handedness, Handedness::Left);

    let Message::Set(geometry) = &messages[2] else {
        panic!("expected the geometry set, got {:?}", messages[2].kind());
    };
    let Some(mesh) = geometry.scene.entities[0].as_mesh() else {
        panic!("geometry set carries no mesh");
    };
    assert_eq!(mesh.transform.id, 1);
    assert_eq!(mesh.counts.len(), 4);
    assert!(mesh.points.iter().all(|p| p.x <= 0.0 && p.x >= -0.02));

    let Message::Delete(delete) = &messages[3] else {
        panic!("expected the delete, got {:?}", messages[3].kind());
    };
    assert_eq!(delete.entities[0].name, "/old");
}

#[test]
fn get_is_served_in_requester_settings() {
    let test = TestServer::start();
    let settings = test.client_settings();
    let requester = thread::spawn(move || {
        let client = Client::new(settings).unwrap();
        let mut get = GetMessage::default();
        get.scene_settings.handedness = Handedness::Right;
        get.scene_settings.scale_factor = 10.0;
        client.send_get(&get)
    });

    let server = &test.server;
    let mut served = false;
    test.collect_answering(1, WAIT, |message| {
        if let Message::Get(_) = message {
            if let Some(mut scene) = server.begin_serve_scene() {
                scene.add_entity(transform_at("/host", Vec3::new(1.0, 2.0, 3.0)));
                scene.add_entity(quad_grid("/host/mesh", 1, 1));
                served = server.end_serve_scene(scene);
            }
        }
        None
    });
    assert!(served);

    let scene = requester.join().unwrap().unwrap();
    assert_eq!(scene.settings.handedness, Handedness::Right);
    let Some(host) = scene.find_entity("/host") else {
        panic!("served scene lacks /host");
    };
    assert_eq!(host.transform().position, Vec3::new(-10.0, 20.0, 30.0));
    let Some(mesh) = scene.find_entity("/host/mesh").and_then(|entity| entity.as_mesh()) else {
        panic!("served scene lacks /host/mesh");
    };
    assert!(mesh.points.contains(&Vec3::new(-10.0, 10.0, 0.0)));
}

#[test]
fn query_is_answered_by_host() {
    let test = TestServer::start();
    let settings = test.client_settings();
    let requester = thread::spawn(move || {
        let client = Client::new(settings).unwrap();
        let mut query = QueryMessage::new(QueryType::AllNodes);
        query.header.message_id = 3;
        client.send_query(&query)
    });

    test.collect_answering(1, WAIT, |message| match message {
        Message::Query(query) if query.query_type == QueryType::AllNodes => {
            let mut response = ResponseMessage::default();
            response.text = vec![String::from("/a"), String::from("/b")];
            Some(response)
        }
        _ => None,
    });

    let response = requester.join().unwrap().unwrap();
    assert_eq!(response.text, vec![String::from("/a"), String::from("/b")]);
    assert_eq!(response.header.message_id, 3);
}

#[test]
fn text_reaches_host() {
    let test = TestServer::start();
    let client = Client::new(test.client_settings()).unwrap();
    client
        .send_text(&TextMessage::new("mesh has no uv", TextType::Warning))
        .unwrap();

    let messages = test.collect(1, WAIT);
    let Some(Message::Text(text)) = messages.first() else {
        panic!("no text message arrived");
    };
    assert_eq!(text.text, "mesh has no uv");
    assert_eq!(text.text_type, TextType::Warning);
}

#[test]
fn poll_wakes_on_notify_and_times_out_otherwise() {
    let test = TestServer::start();
    let settings = test.client_settings();
    let poller = thread::spawn(move || {
        let client = Client::new(settings).unwrap();
        client.send_poll(&PollMessage::new(PollType::SceneUpdate))
    });
    thread::sleep(Duration::from_millis(150));
    test.server.notify_poll(PollType::SceneUpdate);
    assert!(poller.join().unwrap().unwrap());

    let client = Client::new(test.client_settings()).unwrap();
    assert!(!client.send_poll(&PollMessage::new(PollType::SceneUpdate)).unwrap());
}

#[test]
fn running_server_is_available() {
    let test = TestServer::start();
    let mut client = Client::new(test.client_settings()).unwrap();
    assert!(client.is_server_available());

    let mut sender = AsyncSceneSender::new(1, test.client_settings()).unwrap();
    assert!(sender.is_server_available());
    assert!(sender.error_message().is_empty());
}
