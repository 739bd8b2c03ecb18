//! Store Monitor - 门店在线率监控服务
//!
//! # 架构概述
//!
//! - **导入** (`ingestion`): 三个 CSV 文件 → SQLite，并记录批次参考时间
//! - **数据库** (`db`): SQLite (sqlx)，WAL 模式
//! - **报告** (`reports`): 队列 + Worker，调用 `uptime_engine` 计算并输出 CSV
//! - **HTTP API** (`api`): 触发报告、查询/下载报告
//!
//! # 模块结构
//!
//! ```text
//! store-monitor/src/
//! ├── core/          # 配置、状态、错误、后台任务
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 数据库层 (models + repository)
//! ├── ingestion/     # CSV 导入
//! ├── reports/       # 报告任务
//! └── utils/         # 日志、错误、时间工具
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod ingestion;
pub mod reports;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerState};
pub use ingestion::{IngestionSummary, run_full_ingestion};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::init_logger_with_file;

/// 设置运行环境
///
/// 1. 加载 `.env` (不存在时忽略)
/// 2. 按 LOG_LEVEL / LOG_DIR 初始化日志
///
/// 返回加载好的配置
pub fn setup_environment() -> Config {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let config = Config::from_env();
    if let Some(dir) = &config.log_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!("Failed to create log directory {dir}: {e}");
    }
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());

    if dotenv_loaded {
        tracing::debug!("Loaded environment from .env");
    }
    config
}
