//! Report API 模块
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /trigger_report/{store_id} | POST | 创建报告任务，返回 report_id |
//! | /get_report/{report_id} | GET | 查询状态或下载 CSV |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/trigger_report/{store_id}", post(handler::trigger))
        .route("/get_report/{report_id}", get(handler::get))
}
