//! Report Worker - 报告生成
//!
//! 从 mpsc 通道消费 [`ReportJob`]，并发数由 Semaphore 限制
//! (MAX_REPORT_WORKERS)，每个任务受 REPORT_TIMEOUT_SECS 约束。
//!
//! 任何失败都会把报告标记为 FAILED；进程退出时仍在队列中的任务
//! 由下次启动的 [`recover_unfinished_reports`] 处理。

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use sqlx::SqlitePool;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::{PublishGate, ReportError, ReportJob, ReportResult, build_context, write_report};
use crate::core::Config;
use crate::core::tasks::panic_message;
use crate::db::repository::report;

pub struct ReportWorker {
    pool: SqlitePool,
    config: Config,
    semaphore: Arc<Semaphore>,
    timeout: Duration,
}

impl ReportWorker {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let permits = config.max_report_workers.max(1);
        let timeout = Duration::from_secs(config.report_timeout_secs.max(1));
        Self {
            pool,
            config,
            semaphore: Arc::new(Semaphore::new(permits)),
            timeout,
        }
    }

    /// Consume jobs until the channel closes or `shutdown` fires.
    ///
    /// In-flight jobs are awaited before returning; each is bounded by the timeout.
    pub async fn run(self, mut rx: mpsc::Receiver<ReportJob>, shutdown: CancellationToken) {
        tracing::info!(
            concurrency = self.config.max_report_workers,
            timeout_secs = self.timeout.as_secs(),
            "ReportWorker started"
        );

        let worker = Arc::new(self);
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("ReportWorker received shutdown signal");
                    break;
                }
                job = rx.recv() => {
                    let Some(job) = job else {
                        tracing::info!("Report channel closed, shutting down ReportWorker");
                        break;
                    };
                    // 先拿许可再 spawn，队列自然形成背压
                    let Ok(permit) = worker.semaphore.clone().acquire_owned().await else {
                        break;
                    };
                    let w = worker.clone();
                    in_flight.spawn(async move {
                        let report_id = job.report_id.clone();
                        w.run_guarded(&report_id, w.handle(job)).await;
                        drop(permit);
                    });
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        tracing::error!(error = %e, "Report task aborted");
                    }
                }
            }
        }

        if !in_flight.is_empty() {
            tracing::info!(count = in_flight.len(), "Waiting for in-flight report jobs");
        }
        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Report task aborted");
            }
        }
        tracing::info!("ReportWorker stopped");
    }

    /// Drive one job with panics caught; a panicking job is still marked FAILED
    async fn run_guarded<F>(&self, report_id: &str, job: F)
    where
        F: Future<Output = ()>,
    {
        if let Err(panic_info) = AssertUnwindSafe(job).catch_unwind().await {
            tracing::error!(
                report_id = %report_id,
                panic = %panic_message(panic_info.as_ref()),
                "Report job panicked"
            );
            self.fail(report_id).await;
        }
    }

    /// Run one job under the timeout and record its outcome
    async fn handle(&self, job: ReportJob) {
        let started = Instant::now();
        let gate = PublishGate::new();

        match tokio::time::timeout(self.timeout, self.process(&job, &gate)).await {
            Ok(Ok(path)) => tracing::info!(
                report_id = %job.report_id,
                store_id = %job.store_id,
                file = %path.display(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Report complete"
            ),
            Ok(Err(e)) => {
                tracing::error!(
                    report_id = %job.report_id,
                    store_id = %job.store_id,
                    error = %e,
                    "Report failed"
                );
                self.fail(&job.report_id).await;
            }
            Err(_) => {
                tracing::error!(
                    report_id = %job.report_id,
                    store_id = %job.store_id,
                    error = %ReportError::Timeout(self.timeout.as_secs()),
                    "Report failed"
                );
                // 先落 FAILED：已 COMPLETE 的报告保留文件，否则阻止 blocking 线程再发布
                if self.fail(&job.report_id).await {
                    gate.abandon(&self.config.report_file_path(&job.report_id));
                }
            }
        }
    }

    /// Mark the report FAILED.
    ///
    /// Returns `false` only when the report had already finished.
    async fn fail(&self, report_id: &str) -> bool {
        match report::mark_failed(&self.pool, report_id).await {
            Ok(changed) => changed,
            Err(e) => {
                tracing::error!(report_id = %report_id, error = %e, "Failed to mark report as failed");
                true
            }
        }
    }

    /// PENDING → RUNNING → calculate → CSV → COMPLETE
    async fn process(&self, job: &ReportJob, gate: &PublishGate) -> ReportResult<PathBuf> {
        report::mark_running(&self.pool, &job.report_id).await?;

        let context = build_context(&self.pool, &job.store_id, job.reference, &self.config).await?;
        let path = self.config.report_file_path(&job.report_id);

        // 计算与写文件都是同步操作，放到 blocking 线程池
        let reference = job.reference;
        let target = path.clone();
        let gate = gate.clone();
        tokio::task::spawn_blocking(move || -> ReportResult<()> {
            if gate.is_abandoned() {
                return Err(ReportError::Abandoned);
            }
            let row = uptime_engine::calculate(&context, reference)?;
            write_report(&target, &row, &gate)
        })
        .await
        .map_err(|e| ReportError::Internal(format!("Report task aborted: {e}")))??;

        report::mark_complete(&self.pool, &job.report_id, &path.to_string_lossy()).await?;
        Ok(path)
    }
}

/// 启动预热：上次进程遗留的 PENDING / RUNNING 报告已无任务处理，统一标记 FAILED
///
/// 只处理 `started_at` 之前创建的报告，本次进程新建的报告不受影响
pub async fn recover_unfinished_reports(pool: SqlitePool, started_at: i64) {
    match report::fail_unfinished(&pool, started_at).await {
        Ok(0) => tracing::debug!("No unfinished reports to recover"),
        Ok(n) => tracing::warn!(count = n, "Marked unfinished reports from previous run as failed"),
        Err(e) => tracing::error!(error = %e, "Failed to recover unfinished reports"),
    }
}
