//! `/localfile/?path=` endpoint
//!
//! Streams glb/gltf files by absolute path. Range and conditional requests are
//! handled by `ServeFile`; this layer only validates the path and decorates the
//! response. The server never touches the store.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use axum::{
    body::Body,
    extract::{Query, Request, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::models::FileServerSettings;
use crate::services::WatchRoots;
use crate::utils::error::{AppError, AppResult};
use crate::utils::ModelFormat;

pub const LOCAL_FILE_ROUTE: &str = "/localfile/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileServerConfig {
    /// Refuse paths that are not under a registered watch folder
    pub restrict_to_watch_folders: bool,
    pub cache_max_age_secs: u32,
}

impl FileServerConfig {
    /// Serves any glb/gltf path the process can read
    pub fn unrestricted() -> Self {
        Self {
            restrict_to_watch_folders: false,
            ..Self::default()
        }
    }
}

impl Default for FileServerConfig {
    fn default() -> Self {
        Self::from(&FileServerSettings::default())
    }
}

impl From<&FileServerSettings> for FileServerConfig {
    fn from(settings: &FileServerSettings) -> Self {
        Self {
            restrict_to_watch_folders: settings.restrict_to_watch_folders,
            cache_max_age_secs: settings.cache_max_age_secs,
        }
    }
}

#[derive(Clone)]
struct ServerState {
    config: FileServerConfig,
    roots: WatchRoots,
}

#[derive(Debug, Deserialize)]
struct LocalFileQuery {
    path: Option<String>,
}

fn plain(status: StatusCode, message: &'static str) -> Response {
    (status, message).into_response()
}

async fn serve_local_file(
    State(state): State<ServerState>,
    Query(query): Query<LocalFileQuery>,
    request: Request,
) -> Response {
    let raw_path = match query.path.as_deref() {
        Some(p) if !p.is_empty() => p,
        _ => return plain(StatusCode::BAD_REQUEST, "missing path parameter"),
    };
    let path = PathBuf::from(raw_path);

    let format = match ModelFormat::from_path(&path) {
        Some(format) => format,
        None => {
            tracing::debug!("refusing non-model file {}", raw_path);
            return plain(StatusCode::FORBIDDEN, "forbidden file type");
        }
    };

    if state.config.restrict_to_watch_folders && !state.roots.contains(&path) {
        tracing::debug!("refusing {} outside watch folders", raw_path);
        return plain(StatusCode::FORBIDDEN, "path outside watch folders");
    }

    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => {}
        _ => return plain(StatusCode::NOT_FOUND, "file not found"),
    }

    if let Err(e) = tokio::fs::File::open(&path).await {
        tracing::warn!("cannot open {}: {}", raw_path, e);
        return plain(StatusCode::INTERNAL_SERVER_ERROR, "cannot open file");
    }

    tracing::debug!("serving {}", raw_path);

    let mut response = match ServeFile::new(&path).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    };

    let success = response.status().is_success();
    let headers = response.headers_mut();
    if success {
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(format.content_type()),
        );
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    if let Ok(cache) = HeaderValue::from_str(&format!(
        "public, max-age={}",
        state.config.cache_max_age_secs
    )) {
        headers.insert(header::CACHE_CONTROL, cache);
    }

    response
}

/// Router with the local file route mounted with and without the trailing slash
pub fn make_router(config: FileServerConfig, roots: WatchRoots) -> Router {
    let state = ServerState { config, roots };

    Router::new()
        .route(LOCAL_FILE_ROUTE, get(serve_local_file))
        .route("/localfile", get(serve_local_file))
        .with_state(state)
}

/// Running file server bound to an ephemeral loopback port
pub struct FileServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl FileServer {
    /// Bind `127.0.0.1:0` and start accepting on the current tokio runtime
    pub async fn start(config: FileServerConfig, roots: WatchRoots) -> AppResult<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .map_err(|e| AppError::Server(format!("cannot bind file server: {}", e)))?;
        let addr = listener
            .local_addr()
            .map_err(|e| AppError::Server(format!("cannot read bound address: {}", e)))?;

        let app = make_router(config, roots);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await;

            if let Err(e) = result {
                tracing::error!("file server stopped: {}", e);
            }
        });

        tracing::info!("file server listening on http://{}", addr);

        Ok(Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// URL the renderer fetches `path` from
    pub fn file_url(&self, path: &Path) -> String {
        format!(
            "{}{}?path={}",
            self.base_url(),
            LOCAL_FILE_ROUTE,
            urlencoding::encode(&path.to_string_lossy())
        )
    }

    /// Stop accepting, let in-flight requests finish, then return
    pub async fn shutdown(mut self) -> AppResult<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            tx.send(()).ok();
        }
        if let Some(handle) = self.handle.take() {
            handle
                .await
                .map_err(|e| AppError::Server(format!("file server task failed: {}", e)))?;
        }
        tracing::info!("file server on port {} stopped", self.addr.port());
        Ok(())
    }
}

impl Drop for FileServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            tx.send(()).ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use std::fs;
    use tempfile::TempDir;

    const GLB_BYTES: &[u8] = b"glTF\x02\x00\x00\x00payload";

    fn request_for(path: &Path) -> Request {
        Request::builder()
            .uri(format!(
                "{}?path={}",
                LOCAL_FILE_ROUTE,
                urlencoding::encode(&path.to_string_lossy())
            ))
            .body(Body::empty())
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    fn unrestricted() -> Router {
        make_router(FileServerConfig::unrestricted(), WatchRoots::new())
    }

    #[tokio::test]
    async fn serves_glb_with_headers() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("ship.glb");
        fs::write(&file, GLB_BYTES).unwrap();

        let response = unrestricted().oneshot(request_for(&file)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "model/gltf-binary");
        assert_eq!(headers[header::CONTENT_LENGTH], GLB_BYTES.len().to_string().as_str());
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=3600");
        assert!(headers.contains_key(header::LAST_MODIFIED));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], GLB_BYTES);
    }

    #[tokio::test]
    async fn serves_gltf_case_insensitively() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("Scene.GLTF");
        fs::write(&file, br#"{"asset":{"version":"2.0"}}"#).unwrap();

        let response = unrestricted().oneshot(request_for(&file)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "model/gltf+json");
    }

    #[tokio::test]
    async fn missing_path_is_bad_request() {
        for uri in ["/localfile/", "/localfile/?path=", "/localfile"] {
            let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
            let response = unrestricted().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body_text(response).await, "missing path parameter");
        }
    }

    #[tokio::test]
    async fn non_model_extension_is_forbidden() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("passwords.txt");
        fs::write(&file, b"secret").unwrap();

        let response = unrestricted().oneshot(request_for(&file)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_text(response).await, "forbidden file type");
    }

    #[tokio::test]
    async fn missing_file_and_directory_are_not_found() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("looks-like.glb");
        fs::create_dir_all(&dir).unwrap();

        for path in [tmp.path().join("gone.glb"), dir] {
            let response = unrestricted().oneshot(request_for(&path)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            assert_eq!(body_text(response).await, "file not found");
        }
    }

    #[tokio::test]
    async fn range_request_returns_partial_content() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("ship.glb");
        fs::write(&file, GLB_BYTES).unwrap();

        let mut request = request_for(&file);
        request
            .headers_mut()
            .insert(header::RANGE, HeaderValue::from_static("bytes=0-3"));

        let response = unrestricted().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(
            response.headers()[header::CONTENT_RANGE],
            format!("bytes 0-3/{}", GLB_BYTES.len()).as_str()
        );
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "model/gltf-binary");
        assert_eq!(body_text(response).await, "glTF");
    }

    #[tokio::test]
    async fn conditional_request_returns_not_modified() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("ship.glb");
        fs::write(&file, GLB_BYTES).unwrap();
        let app = unrestricted();

        let first = app.clone().oneshot(request_for(&file)).await.unwrap();
        let last_modified = first.headers()[header::LAST_MODIFIED].clone();

        let mut request = request_for(&file);
        request
            .headers_mut()
            .insert(header::IF_MODIFIED_SINCE, last_modified);
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn containment_limits_paths_to_watch_folders() {
        let tmp = TempDir::new().unwrap();
        let library = tmp.path().join("library");
        let outside = tmp.path().join("outside");
        fs::create_dir_all(&library).unwrap();
        fs::create_dir_all(&outside).unwrap();
        fs::write(library.join("ok.glb"), GLB_BYTES).unwrap();
        fs::write(outside.join("nope.glb"), GLB_BYTES).unwrap();

        let roots = WatchRoots::new();
        roots.replace(vec![library.clone()]);
        let app = make_router(FileServerConfig::default(), roots);

        let inside = app.clone().oneshot(request_for(&library.join("ok.glb"))).await.unwrap();
        assert_eq!(inside.status(), StatusCode::OK);

        let escaped = library.join("..").join("outside").join("nope.glb");
        for path in [outside.join("nope.glb"), escaped] {
            let response = app.clone().oneshot(request_for(&path)).await.unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
            assert_eq!(body_text(response).await, "path outside watch folders");
        }
    }

    #[tokio::test]
    async fn custom_cache_age() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("ship.glb");
        fs::write(&file, GLB_BYTES).unwrap();

        let config = FileServerConfig {
            restrict_to_watch_folders: false,
            cache_max_age_secs: 60,
        };
        let response = make_router(config, WatchRoots::new())
            .oneshot(request_for(&file))
            .await
            .unwrap();
        assert_eq!(response.headers()[header::CACHE_CONTROL], "public, max-age=60");
    }

    #[tokio::test]
    async fn server_binds_loopback_and_shuts_down() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("ship.glb");
        fs::write(&file, GLB_BYTES).unwrap();

        let server = FileServer::start(FileServerConfig::unrestricted(), WatchRoots::new())
            .await
            .unwrap();
        assert!(server.port() > 0);
        assert_eq!(server.base_url(), format!("http://127.0.0.1:{}", server.port()));

        let url = server.file_url(&file);
        let response = reqwest::get(&url).await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(&response.bytes().await.unwrap()[..], GLB_BYTES);

        server.shutdown().await.unwrap();
        assert!(reqwest::get(&url).await.is_err());
    }
}
