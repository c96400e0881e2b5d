use std::{
    collections::HashMap,
    fs, io,
    path::{Component, Path, PathBuf},
};

use http::{HeaderValue, Response, StatusCode};

use crate::transport::http::{respond, text_response};

const DEFAULT_MIME_TYPE: &str = "text/plain";

/// Served when the root has no `mimetypes.txt` or it lacks the extension
const BUILTIN_MIME_TYPES: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("htm", "text/html"),
    ("js", "text/javascript"),
    ("mjs", "text/javascript"),
    ("css", "text/css"),
    ("json", "application/json"),
    ("wasm", "application/wasm"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
];

/// Extension to MIME type lookup, loaded from a `mimetypes.txt` with one
/// `extension mimetype` pair per line. `default()` holds the built-in types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeTable {
    types: HashMap<String, String>,
}

impl Default for MimeTable {
    fn default() -> Self {
        let types = BUILTIN_MIME_TYPES
            .iter()
            .map(|(extension, mime_type)| (extension.to_string(), mime_type.to_string()))
            .collect();
        Self { types }
    }
}

impl MimeTable {
    pub fn load(path: &Path) -> io::Result<Self> {
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    pub fn parse(text: &str) -> Self {
        let mut types = HashMap::new();
        for line in text.lines() {
            let Some((extension, mime_type)) = line.trim().split_once(' ') else {
                continue;
            };
            let extension = extension.trim_start_matches('.').to_ascii_lowercase();
            let mime_type = mime_type.trim();
            if !extension.is_empty() && !mime_type.is_empty() {
                types.insert(extension, mime_type.to_string());
            }
        }
        Self { types }
    }

    /// Adds the entries of `other`, replacing types of the same extension
    pub fn merge(&mut self, other: MimeTable) {
        self.types.extend(other.types);
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// MIME type of a file name, `text/plain` when unknown
    pub fn mime_type(&self, path: &Path) -> &str {
        path.extension()
            .and_then(|extension| extension.to_str())
            .and_then(|extension| self.types.get(&extension.to_ascii_lowercase()))
            .map(String::as_str)
            .unwrap_or(DEFAULT_MIME_TYPE)
    }
}

/// The directory served for non-protocol URIs
#[derive(Debug, Clone, Default)]
pub(crate) struct StaticFiles {
    root: Option<PathBuf>,
    mime_types: MimeTable,
}

impl StaticFiles {
    pub fn new(root: Option<PathBuf>) -> Self {
        let mut mime_types = MimeTable::default();
        if let Some(root) = &root {
            let path = root.join("mimetypes.txt");
            match MimeTable::load(&path) {
                Ok(loaded) => mime_types.merge(loaded),
                Err(error) => {
                    log::info!("MIME table {} not loaded, using built-in types: {}", path.display(), error)
                }
            }
        }
        Self { root, mime_types }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// File under the root for a URI path. Hidden files and any path
    /// leaving the root resolve to nothing.
    pub fn resolve(&self, uri_path: &str) -> Option<PathBuf> {
        let root = self.root.as_ref()?;
        let relative = uri_path.trim_start_matches('/');
        if relative.is_empty() {
            return Some(root.join("index.html"));
        }

        let relative = Path::new(relative);
        let mut resolved = root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    if part.to_string_lossy().starts_with('.') {
                        return None;
                    }
                    resolved.push(part);
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Some(resolved)
    }

    pub async fn serve(&self, uri_path: &str) -> Response<Vec<u8>> {
        let Some(path) = self.resolve(uri_path) else {
            return text_response(StatusCode::NOT_FOUND, "");
        };
        match tokio::fs::read(&path).await {
            Ok(data) => self.file_response(&path, data),
            Err(_) => text_response(StatusCode::NOT_FOUND, ""),
        }
    }

    pub fn file_response(&self, path: &Path, data: Vec<u8>) -> Response<Vec<u8>> {
        let content_type = HeaderValue::from_str(self.mime_types.mime_type(path))
            .unwrap_or(HeaderValue::from_static(DEFAULT_MIME_TYPE));
        respond(StatusCode::OK, content_type, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_extensions_with_or_without_dot() {
        let table = MimeTable::parse(".html text/html\npng image/png\n\nbroken\n");
        assert_eq!(table.len(), 2);
        assert_eq!(table.mime_type(Path::new("index.HTML")), "text/html");
        assert_eq!(table.mime_type(Path::new("shot.png")), "image/png");
        assert_eq!(table.mime_type(Path::new("notes.md")), "text/plain");
        assert_eq!(table.mime_type(Path::new("README")), "text/plain");
    }

    #[test]
    fn root_serves_index() {
        let files = StaticFiles {
            root: Some(PathBuf::from("site")),
            mime_types: MimeTable::default(),
        };
        assert_eq!(files.resolve("/"), Some(PathBuf::from("site/index.html")));
        assert_eq!(files.resolve(""), Some(PathBuf::from("site/index.html")));
        assert_eq!(
            files.resolve("/css/main.css"),
            Some(PathBuf::from("site/css/main.css"))
        );
    }

    #[test]
    fn escaping_and_hidden_paths_are_refused() {
        let files = StaticFiles {
            root: Some(PathBuf::from("site")),
            mime_types: MimeTable::default(),
        };
        assert_eq!(files.resolve("/../secret"), None);
        assert_eq!(files.resolve("/css/../../secret"), None);
        assert_eq!(files.resolve("/.git/config"), None);
    }

    fn content_type(files: &StaticFiles, name: &str) -> String {
        let response = files.file_response(Path::new(name), Vec::new());
        response.headers()[http::header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn builtin_types_without_mime_file() {
        let root = std::env::temp_dir().join(format!("meshsync-mime-builtin-{}", std::process::id()));
        fs::create_dir_all(&root).unwrap();
        let files = StaticFiles::new(Some(root.clone()));

        assert_eq!(content_type(&files, "index.html"), "text/html");
        assert_eq!(content_type(&files, "app.js"), "text/javascript");
        assert_eq!(content_type(&files, "main.css"), "text/css");
        assert_eq!(content_type(&files, "shot.PNG"), "image/png");
        assert_eq!(content_type(&files, "photo.jpeg"), "image/jpeg");
        assert_eq!(content_type(&files, "notes.md"), "text/plain");
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn mime_file_overrides_builtin_types() {
        let root = std::env::temp_dir().join(format!("meshsync-mime-file-{}", std::process::id()));
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("mimetypes.txt"), "js application/javascript
md text/markdown
").unwrap();
        let files = StaticFiles::new(Some(root.clone()));

        assert_eq!(content_type(&files, "app.js"), "application/javascript");
        assert_eq!(content_type(&files, "notes.md"), "text/markdown");
        assert_eq!(content_type(&files, "index.html"), "text/html");
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn no_root_serves_nothing() {
        assert_eq!(StaticFiles::new(None).resolve("/index.html"), None);
    }
}
