#![allow(dead_code)]

use std::path::Path;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use store_monitor::db::DbService;
use store_monitor::{Config, ServerState};
use tempfile::TempDir;
use tower::ServiceExt;

pub const STORE_A: &str = "8c0a9d3c-f2f5-4d3b-9f6b-9a3c1f1e2d4b";
pub const STORE_B: &str = "1f5e3c2a-7d1b-4c8e-9a0f-2b3c4d5e6f70";
pub const STORE_C: &str = "2b6f4d3e-8e2c-4d9f-8b1a-3c4d5e6f7a81";
pub const STORE_D: &str = "3c7a5e4f-9f3d-4eaf-9c2b-4d5e6f7a8b92";

pub struct TestEnv {
    /// Keeps the temporary directory alive
    pub dir: TempDir,
    pub config: Config,
    pub state: ServerState,
}

impl TestEnv {
    pub fn router(&self) -> Router {
        store_monitor::api::build_router(self.state.clone())
    }

    pub fn pool(&self) -> &sqlx::SqlitePool {
        &self.state.pool
    }
}

/// Fresh database and work dir; input CSVs point into the temp dir
pub async fn setup() -> TestEnv {
    let dir = tempfile::tempdir().expect("tempdir");
    let work_dir = dir.path().to_string_lossy().into_owned();

    let mut config = Config::with_work_dir(work_dir);
    config.default_timezone = "America/Chicago".into();
    config.poll_fetch_buffer_hours = 1;
    config.max_report_workers = 2;
    config.report_timeout_secs = 30;
    config.log_dir = None;
    config.status_csv = path_str(dir.path(), "store_status.csv");
    config.business_hours_csv = path_str(dir.path(), "menu_hours.csv");
    config.timezone_csv = path_str(dir.path(), "timezones.csv");

    config.ensure_work_dir_structure().expect("work dir");
    let db = DbService::new(&config.database_path).await.expect("database");
    let state = ServerState::new(config.clone(), db.pool);

    TestEnv { dir, config, state }
}

pub fn path_str(dir: &Path, file: &str) -> String {
    dir.join(file).to_string_lossy().into_owned()
}

pub fn write_file(path: &str, content: &str) {
    std::fs::write(path, content).expect("write csv");
}

pub async fn send(app: &Router, method: &str, uri: &str) -> (Response<Body>, Bytes) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    let (parts, body) = response.into_parts();
    let bytes = body.collect().await.expect("body").to_bytes();
    (Response::from_parts(parts, Body::empty()), bytes)
}

pub fn json(bytes: &Bytes) -> serde_json::Value {
    serde_json::from_slice(bytes).expect("json body")
}
