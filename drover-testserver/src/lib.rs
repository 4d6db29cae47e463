//! Small in-process HTTP target for exercising the harness in tests.
//!
//! Serves a toy record-store API: list albums, fetch one by id, create one.
//! A couple of extra routes (`/slow`, `/status/{code}`) exist purely to
//! provoke the failure paths a load harness has to handle.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::{Duration, sleep};

pub mod tracing;

pub const PATH_ALBUMS: &str = "/albums";
pub const PATH_ALBUM_BY_ID: &str = "/albums/{id}";
pub const PATH_SLOW: &str = "/slow";
pub const PATH_STATUS: &str = "/status/{code}";

/// Ids that always resolve, so GET-by-id never 404s in happy-path tests.
pub const SEEDED_ALBUM_IDS: [u64; 3] = [1, 2, 3];

#[derive(Debug, Clone, Default)]
pub struct TestServerStats {
    requests_total: Arc<AtomicU64>,
    albums_created: Arc<AtomicU64>,
}

impl TestServerStats {
    fn inc_requests_total(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_albums_created(&self) {
        self.albums_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn albums_created(&self) -> u64 {
        self.albums_created.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Serialize)]
struct Album {
    id: u64,
    title: String,
    artist: String,
}

fn seeded_album(id: u64) -> Album {
    Album {
        id,
        title: format!("Album {id}"),
        artist: "Test Artist".to_string(),
    }
}

async fn handle_list_albums(State(stats): State<TestServerStats>) -> (StatusCode, String) {
    stats.inc_requests_total();

    let albums: Vec<Album> = SEEDED_ALBUM_IDS.iter().map(|id| seeded_album(*id)).collect();
    match serde_json::to_string(&albums) {
        Ok(body) => (StatusCode::OK, body),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, String::new()),
    }
}

async fn handle_get_album(
    State(stats): State<TestServerStats>,
    Path(id): Path<u64>,
) -> (StatusCode, String) {
    stats.inc_requests_total();

    if !SEEDED_ALBUM_IDS.contains(&id) {
        return (StatusCode::NOT_FOUND, String::new());
    }

    match serde_json::to_string(&seeded_album(id)) {
        Ok(body) => (StatusCode::OK, body),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, String::new()),
    }
}

#[derive(Debug, Deserialize)]
struct CreateAlbum {
    #[allow(dead_code)]
    id: serde_json::Value,
    #[allow(dead_code)]
    title: Option<String>,
    #[allow(dead_code)]
    artist: Option<String>,
}

async fn handle_create_album(
    State(stats): State<TestServerStats>,
    body: Bytes,
) -> (StatusCode, Bytes) {
    stats.inc_requests_total();

    if serde_json::from_slice::<CreateAlbum>(&body).is_err() {
        return (StatusCode::BAD_REQUEST, Bytes::from_static(b"bad json"));
    }

    stats.inc_albums_created();
    (StatusCode::CREATED, body)
}

async fn handle_slow(State(stats): State<TestServerStats>) -> &'static str {
    stats.inc_requests_total();
    sleep(Duration::from_millis(50)).await;
    "slow"
}

async fn handle_status(
    State(stats): State<TestServerStats>,
    Path(code): Path<u16>,
) -> StatusCode {
    stats.inc_requests_total();
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

pub fn router(stats: TestServerStats) -> Router {
    Router::new()
        .route(PATH_ALBUMS, get(handle_list_albums).post(handle_create_album))
        .route(PATH_ALBUM_BY_ID, get(handle_get_album))
        .route(PATH_SLOW, get(handle_slow))
        .route(PATH_STATUS, get(handle_status))
        .with_state(stats)
}

pub struct TestServer {
    addr: SocketAddr,
    base_url: String,
    stats: TestServerStats,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let stats = TestServerStats::default();
        let app = router(stats.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = serve.await;
        });

        let base_url = format!("http://{addr}");

        Ok(Self {
            addr,
            base_url,
            stats,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn stats(&self) -> &TestServerStats {
        &self.stats
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if self.shutdown_tx.is_some()
            && let Some(task) = self.task.take()
        {
            task.abort();
        }
    }
}
