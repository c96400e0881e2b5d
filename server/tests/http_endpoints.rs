use std::{
    fs,
    io::{Read, Write},
    net::{SocketAddr, TcpStream},
    thread,
    time::{Duration, Instant},
};

use meshsync_server::{Server, ServerError, ServerSettings, ServerTimeouts};
use meshsync_shared::{
    ByteReader, FenceMessage, FenceType, GetMessage, Handedness, Message, MessageBody,
    PollType, QueryMessage, QueryType, ResponseMessage, Scene, Serde, SetMessage, TextType,
    Transform, PLUGIN_VERSION, PROTOCOL_VERSION,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn short_timeouts() -> ServerTimeouts {
    ServerTimeouts {
        get: Duration::from_secs(2),
        query: Duration::from_millis(300),
        poll: Duration::from_millis(300),
        screenshot: Duration::from_millis(300),
    }
}

fn start_server() -> (Server, SocketAddr) {
    init_logger();
    let mut server = Server::new(ServerSettings {
        port: 0,
        max_threads: 2,
        timeouts: short_timeouts(),
        ..ServerSettings::default()
    });
    server.start().expect("server should start");
    let port = server.local_addr().expect("bound address").port();
    (server, SocketAddr::from(([127, 0, 0, 1], port)))
}

/// Sends one request and returns the status code and body.
fn request(
    addr: SocketAddr,
    method: &str,
    path: &str,
    content_type: &str,
    body: &[u8],
) -> (u16, Vec<u8>) {
    let mut stream = TcpStream::connect(addr).expect("connect");
    let head = format!(
        "{} {} HTTP/1.1\r\nHost: localhost\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n",
        method,
        path,
        content_type,
        body.len()
    );
    stream.write_all(head.as_bytes()).unwrap();
    stream.write_all(body).unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).unwrap();
    let split = response
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .expect("response head");
    let status_line = String::from_utf8_lossy(&response[..split]).into_owned();
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .expect("status code");
    (status, response[split + 4..].to_vec())
}

fn post<M: MessageBody>(addr: SocketAddr, path: &str, message: &M) -> (u16, Vec<u8>) {
    request(addr, "POST", path, "application/octet-stream", &message.encode())
}

fn fence(fence_type: FenceType, session_id: i32) -> FenceMessage {
    let mut message = FenceMessage::new(fence_type);
    message.header.session_id = session_id;
    message
}

// ============================================================================
// Plain endpoints
// ============================================================================

#[test]
fn test_version_endpoints() {
    let (_server, addr) = start_server();

    let (status, body) = request(addr, "GET", "/protocol_version", "text/plain", b"");
    assert_eq!(status, 200);
    assert_eq!(String::from_utf8(body).unwrap(), PROTOCOL_VERSION.to_string());

    let (status, body) = request(addr, "GET", "/plugin_version", "text/plain", b"");
    assert_eq!(status, 200);
    assert_eq!(String::from_utf8(body).unwrap(), PLUGIN_VERSION);
}

#[test]
fn test_version_query_is_answered_without_host() {
    let (server, addr) = start_server();

    let (status, body) = post(addr, "/query", &QueryMessage::new(QueryType::ProtocolVersion));
    assert_eq!(status, 200);
    let response = ResponseMessage::decode(&body).unwrap();
    assert_eq!(response.text, vec![PROTOCOL_VERSION.to_string()]);
    assert_eq!(server.queued_message_count(), 0);
}

#[test]
fn test_not_serving_answers_503() {
    let (server, addr) = start_server();
    server.set_serve(false);
    let (status, _) = request(addr, "GET", "/protocol_version", "text/plain", b"");
    assert_eq!(status, 503);
}

#[test]
fn test_start_twice_is_rejected() {
    let (mut server, _) = start_server();
    assert!(matches!(server.start(), Err(ServerError::AlreadyRunning)));
}

#[test]
fn test_port_in_use_is_a_bind_error() {
    let (_server, addr) = start_server();
    let mut second = Server::new(ServerSettings {
        port: addr.port(),
        ..ServerSettings::default()
    });
    assert!(matches!(
        second.start(),
        Err(ServerError::Bind { port, .. }) if port == addr.port()
    ));
}

// ============================================================================
// Queued messages
// ============================================================================

#[test]
fn test_version_mismatch_answers_400_and_queues_error_text() {
    let (server, addr) = start_server();
    let mut set = SetMessage::default();
    set.header.protocol_version = PROTOCOL_VERSION + 1;

    let (status, _) = post(addr, "/set", &set);
    assert_eq!(status, 400);

    let mut texts = Vec::new();
    server.process_messages(|message| {
        if let Message::Text(text) = message {
            texts.push(text.text_type);
        }
        None
    });
    assert_eq!(texts, vec![TextType::Error]);
}

#[test]
fn test_fenced_set_is_imported_and_applied() {
    let (server, addr) = start_server();

    let mut scene = Scene::default();
    scene.settings.handedness = Handedness::Right;
    let mut transform = Transform::new("/root/child");
    transform.position.x = 2.0;
    scene.add_entity(transform);
    let mut set = SetMessage::new(scene);
    set.header.session_id = 11;

    // the set arrives first and has to wait for its session
    assert_eq!(post(addr, "/set", &set).0, 200);
    assert_eq!(server.process_messages(|_| None), 0);

    assert_eq!(post(addr, "/fence", &fence(FenceType::SceneBegin, 11)).0, 200);
    assert_eq!(post(addr, "/fence", &fence(FenceType::SceneEnd, 11)).0, 200);

    let mut positions = Vec::new();
    let handled = server.process_messages(|message| {
        if let Message::Set(set) = message {
            positions.push(set.scene.entities[0].transform().position.x);
        }
        None
    });
    assert_eq!(handled, 3);
    assert_eq!(positions, vec![-2.0]);
}

#[test]
fn test_browser_text_is_queued() {
    let (server, addr) = start_server();
    let (status, _) = request(addr, "GET", "/text?t=hello%20host", "text/plain", b"");
    // no file root, so the index page is missing
    assert_eq!(status, 404);

    let mut texts = Vec::new();
    server.process_messages(|message| {
        if let Message::Text(text) = message {
            texts.push(text.text.clone());
        }
        None
    });
    assert_eq!(texts, vec![String::from("hello host")]);
}

// ============================================================================
// Requests waiting on the host
// ============================================================================

#[test]
fn test_get_is_served_by_host() {
    let (server, addr) = start_server();

    let mut get = GetMessage::default();
    get.scene_settings.scale_factor = 10.0;
    let requester = thread::spawn(move || post(addr, "/get", &get));

    let deadline = Instant::now() + Duration::from_secs(2);
    let mut served = false;
    while !served && Instant::now() < deadline {
        server.process_messages(|message| {
            if let Message::Get(_) = message {
                if let Some(mut scene) = server.begin_serve_scene() {
                    let mut transform = Transform::new("/host");
                    transform.position.y = 1.5;
                    scene.add_entity(transform);
                    served = server.end_serve_scene(scene);
                }
            }
            None
        });
        thread::sleep(Duration::from_millis(5));
    }
    assert!(served);

    let (status, body) = requester.join().unwrap();
    assert_eq!(status, 200);
    let scene = Scene::de(&mut ByteReader::new(&body)).unwrap();
    let Some(entity) = scene.find_entity("/host") else {
        panic!("served scene lacks the host entity");
    };
    assert_eq!(entity.transform().position.y, 15.0);
}

#[test]
fn test_unanswered_query_times_out_with_empty_response() {
    let (_server, addr) = start_server();
    let (status, body) = post(addr, "/query", &QueryMessage::new(QueryType::AllNodes));
    assert_eq!(status, 200);
    assert!(ResponseMessage::decode(&body).unwrap().text.is_empty());
}

#[test]
fn test_poll_times_out_without_notification() {
    let (_server, addr) = start_server();
    let (status, body) = request(addr, "GET", "/poll", "text/plain", b"");
    assert_eq!(status, 408);
    assert_eq!(body, b"timeout");
}

#[test]
fn test_poll_is_woken_by_notify() {
    let (server, addr) = start_server();
    let poller = thread::spawn(move || request(addr, "GET", "/poll/scene_update", "text/plain", b""));
    thread::sleep(Duration::from_millis(100));
    server.notify_poll(PollType::SceneUpdate);
    let (status, body) = poller.join().unwrap();
    assert_eq!(status, 200);
    assert_eq!(body, b"ok");
}

#[test]
fn test_unknown_poll_type_is_rejected() {
    let (_server, addr) = start_server();
    let (status, _) = request(addr, "GET", "/poll/whatever", "text/plain", b"");
    assert_eq!(status, 400);
}

// ============================================================================
// Static files
// ============================================================================

#[test]
fn test_static_files_use_mime_table() {
    let (server, addr) = start_server();
    let root = std::env::temp_dir().join(format!("meshsync-files-{}", addr.port()));
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("mimetypes.txt"), ".html text/html\n").unwrap();
    fs::write(root.join("index.html"), "<html></html>").unwrap();
    server.set_file_root_path(&root);

    let (status, body) = request(addr, "GET", "/", "text/plain", b"");
    assert_eq!(status, 200);
    assert_eq!(body, b"<html></html>");

    let (status, _) = request(addr, "GET", "/../etc/passwd", "text/plain", b"");
    assert_eq!(status, 404);
    let (status, _) = request(addr, "GET", "/missing.html", "text/plain", b"");
    assert_eq!(status, 404);

    fs::remove_dir_all(&root).unwrap();
}
