use std::{default::Default, path::PathBuf, time::Duration};

use meshsync_shared::{MeshRefineSettings, DEFAULT_PORT};

/// How long request handlers wait for the host to answer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerTimeouts {
    /// Wait for `end_serve_scene` after a Get is handed to the host
    pub get: Duration,
    /// Wait for the host's answer to a Query
    pub query: Duration,
    /// Wait for `notify_poll` before answering "timeout"
    pub poll: Duration,
    /// Wait for `set_screenshot_file_path`
    pub screenshot: Duration,
}

impl Default for ServerTimeouts {
    fn default() -> Self {
        Self {
            get: Duration::from_secs(3),
            query: Duration::from_secs(3),
            poll: Duration::from_secs(10),
            screenshot: Duration::from_secs(3),
        }
    }
}

/// Contains Config properties which will be used by the Server
#[derive(Clone, Debug)]
pub struct ServerSettings {
    /// Connections served at the same time. Further connections are answered
    /// with 503 until one finishes.
    pub max_queue: usize,
    /// Worker threads of the server's runtime
    pub max_threads: usize,
    /// TCP port to listen on. 0 picks a free port, see `Server::local_addr`.
    pub port: u16,
    /// Vertex budget of one split when refining received meshes
    pub mesh_split_unit: i32,
    /// Bone influences kept per vertex when refining received meshes
    pub mesh_max_bone_influence: i32,
    /// Directory served for URIs that are not protocol endpoints. Its
    /// `mimetypes.txt` is loaded as the MIME table.
    pub file_root_path: Option<PathBuf>,
    /// Handler wait limits
    pub timeouts: ServerTimeouts,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            max_queue: 256,
            max_threads: 8,
            port: DEFAULT_PORT,
            mesh_split_unit: MeshRefineSettings::DEFAULT_SPLIT_UNIT,
            mesh_max_bone_influence: 4,
            file_root_path: None,
            timeouts: ServerTimeouts::default(),
        }
    }
}
