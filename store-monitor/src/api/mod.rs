//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`reports`] - 报告触发与下载

pub mod health;
pub mod reports;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};

/// Build a router with all routes registered (no middleware, no state)
pub fn routes() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(reports::router())
}

/// Build the fully configured application
///
/// Used by the HTTP server and by oneshot requests in tests
pub fn build_router(state: ServerState) -> Router {
    routes()
        // CORS - Handle cross-origin requests
        .layer(CorsLayer::permissive())
        // Trace - Request tracing
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
