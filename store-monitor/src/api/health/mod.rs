//! 健康检查路由
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /health | GET | 服务与数据库状态 |
//!
//! ```json
//! {
//!   "status": "ok",
//!   "version": "0.1.0",
//!   "stores": 42,
//!   "reference_time": "2023-01-25T18:13:22.479220Z"
//! }
//! ```

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;
use crate::db::repository::{store, system_state};
use crate::utils::time::format_reference;

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// 状态 (ok | degraded)
    status: &'static str,
    version: &'static str,
    /// 已知门店数 (数据库不可用时缺省)
    #[serde(skip_serializing_if = "Option::is_none")]
    stores: Option<i64>,
    /// 最近一次导入的参考时间
    #[serde(skip_serializing_if = "Option::is_none")]
    reference_time: Option<String>,
}

pub async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let stores = match store::count(&state.pool).await {
        Ok(n) => Some(n),
        Err(e) => {
            tracing::warn!(error = %e, "Health check: database unavailable");
            None
        }
    };
    let reference_time = system_state::get_reference_time(&state.pool)
        .await
        .ok()
        .flatten()
        .map(format_reference);

    Json(HealthResponse {
        status: if stores.is_some() { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        stores,
        reference_time,
    })
}
