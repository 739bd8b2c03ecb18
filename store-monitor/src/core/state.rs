use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::{Mutex, mpsc};

use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::core::{Config, Result, ServerError};
use crate::db::DbService;
use crate::reports::{ReportJob, ReportQueue, ReportWorker, recover_unfinished_reports};
use crate::utils::time::now_millis;

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Clone 浅拷贝 (SqlitePool 与 mpsc::Sender 内部均为 Arc)。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | pool | SqlitePool | SQLite 连接池 |
/// | queue | ReportQueue | 报告任务队列 |
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// SQLite 连接池
    pub pool: SqlitePool,
    /// 报告任务队列 (发送端)
    pub queue: ReportQueue,
    /// 报告任务接收端，由 `start_background_tasks` 取走交给 Worker
    report_rx: Arc<Mutex<Option<mpsc::Receiver<ReportJob>>>>,
}

impl ServerState {
    /// 用已有连接池构造状态 (测试常用)
    pub fn new(config: Config, pool: SqlitePool) -> Self {
        let (queue, rx) = ReportQueue::new();
        Self {
            config,
            pool,
            queue,
            report_rx: Arc::new(Mutex::new(Some(rx))),
        }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 配置校验 (缺省时区、并发数、超时)
    /// 2. 工作目录结构
    /// 3. 数据库 (WAL + 迁移)
    pub async fn initialize(config: &Config) -> Result<Self> {
        config.validate()?;

        config.ensure_work_dir_structure().map_err(|e| {
            ServerError::Config(format!("Failed to create work directory structure: {e}"))
        })?;

        let db = DbService::new(&config.database_path).await?;
        Ok(Self::new(config.clone(), db.pool))
    }

    /// 启动后台任务
    ///
    /// 必须在 `Server::run()` 之前调用，且只能调用一次
    ///
    /// 启动的任务：
    /// - 回收上次遗留的未完成报告 (Warmup)
    /// - 报告生成 Worker
    pub async fn start_background_tasks(&self) -> Result<BackgroundTasks> {
        let rx = self.report_rx.lock().await.take().ok_or_else(|| {
            ServerError::Internal(anyhow::anyhow!("Background tasks already started"))
        })?;

        let mut tasks = BackgroundTasks::new();

        // 以当前时间为界，避免误伤本次启动后新建的报告
        let started_at = now_millis();
        tasks.spawn(
            "report_recovery",
            TaskKind::Warmup,
            recover_unfinished_reports(self.pool.clone(), started_at),
        );

        let worker = ReportWorker::new(self.pool.clone(), self.config.clone());
        let token = tasks.shutdown_token();
        tasks.spawn("report_worker", TaskKind::Worker, async move {
            worker.run(rx, token).await;
        });

        tasks.log_summary();
        Ok(tasks)
    }
}
