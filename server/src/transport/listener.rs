use std::{
    net::{SocketAddr, TcpListener as StdTcpListener},
    sync::Arc,
    thread,
    time::Duration,
};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::{oneshot, Semaphore},
};

use http::StatusCode;

use crate::{
    error::{HttpParseError, ServerError, TransportError},
    server::ServerState,
    transport::http::{
        content_length, find_head_end, response_to_bytes, text_response, try_bytes_to_request,
        MAX_HEAD_BYTES,
    },
};

const READ_CHUNK_SIZE: usize = 8 * 1024;
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// The accepting socket and the thread that owns its runtime
pub(crate) struct Listener {
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Listener {
    /// Binds synchronously so bind errors reach the caller, then hands the
    /// socket to the acceptor thread.
    pub fn spawn(state: Arc<ServerState>) -> Result<Self, ServerError> {
        let port = state.settings.port;
        let socket = StdTcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port)))
            .map_err(|source| ServerError::Bind { port, source })?;
        socket.set_nonblocking(true)?;
        let local_addr = socket.local_addr()?;

        let (shutdown, shutdown_receiver) = oneshot::channel();
        log::info!("Spawning MeshSync acceptor thread for {}", local_addr);
        let thread = thread::Builder::new()
            .name(String::from("meshsync-server"))
            .spawn(move || run_acceptor(socket, state, shutdown_receiver))
            .map_err(|error| ServerError::Runtime(error.to_string()))?;

        Ok(Self {
            local_addr,
            shutdown: Some(shutdown),
            thread: Some(thread),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("MeshSync acceptor thread panicked");
            }
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_acceptor(
    socket: StdTcpListener,
    state: Arc<ServerState>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(state.settings.max_threads.max(1))
        .thread_name("meshsync-worker")
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Failed to create tokio runtime: {}", e);
            return;
        }
    };

    runtime.block_on(async {
        let listener = match TcpListener::from_std(socket) {
            Ok(listener) => listener,
            Err(e) => {
                log::error!("Failed to register MeshSync listener: {}", e);
                return;
            }
        };
        let permits = Arc::new(Semaphore::new(state.settings.max_queue.max(1)));

        log::info!("MeshSync server listening on {:?}", listener.local_addr());
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    log::info!("MeshSync server shutting down");
                    break;
                }
                accepted = listener.accept() => {
                    let (stream, remote_addr) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            log::warn!("Failed to accept connection: {}", e);
                            continue;
                        }
                    };
                    log::trace!("Incoming connection from {}", remote_addr);

                    let Ok(permit) = permits.clone().try_acquire_owned() else {
                        log::warn!("Connection limit reached, refusing {}", remote_addr);
                        tokio::spawn(refuse(stream));
                        continue;
                    };
                    let state = state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &state).await {
                            log::warn!("Connection handling error from {}: {}", remote_addr, e);
                        }
                        drop(permit);
                    });
                }
            }
        }
    });

    runtime.shutdown_timeout(SHUTDOWN_GRACE);
}

async fn refuse(mut stream: TcpStream) {
    let response = text_response(StatusCode::SERVICE_UNAVAILABLE, "");
    let _ = stream.write_all(&response_to_bytes(&response)).await;
    let _ = stream.shutdown().await;
}

/// Serves one request, then closes the connection.
async fn handle_connection(
    mut stream: TcpStream,
    state: &ServerState,
) -> Result<(), TransportError> {
    let mut head = Vec::with_capacity(READ_CHUNK_SIZE);
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    let head_end = loop {
        if let Some(end) = find_head_end(&head) {
            break end;
        }
        if head.len() > MAX_HEAD_BYTES {
            return Err(HttpParseError::HeadTooLarge {
                limit: MAX_HEAD_BYTES,
            }
            .into());
        }
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            return Ok(());
        }
        head.extend_from_slice(&chunk[..read]);
    };

    let parsed = try_bytes_to_request(&head[..head_end])
        .and_then(|request| content_length(&request).map(|length| (request, length)));
    let (request, length) = match parsed {
        Ok(parsed) => parsed,
        Err(error) => {
            let response = text_response(StatusCode::BAD_REQUEST, &error.to_string());
            stream.write_all(&response_to_bytes(&response)).await?;
            return Err(error.into());
        }
    };

    let mut body = state.body_pool.take();
    body.extend_from_slice(&head[head_end..]);
    if body.len() < length {
        let received = body.len();
        body.resize(length, 0);
        stream.read_exact(&mut body[received..]).await?;
    } else {
        body.truncate(length);
    }

    let response = state.handle_request(request.map(|_| body)).await;
    stream.write_all(&response_to_bytes(&response)).await?;
    stream.shutdown().await?;
    Ok(())
}
