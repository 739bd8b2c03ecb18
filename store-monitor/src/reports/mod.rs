//! Report jobs
//!
//! ```text
//! POST /trigger_report ─→ ReportQueue (mpsc) ─→ ReportWorker
//!                                                 ├─ build_context (SQLite)
//!                                                 ├─ uptime_engine::calculate (blocking pool)
//!                                                 ├─ write_report → REPORTS_DIR/report_{id}.csv
//!                                                 └─ report: PENDING → RUNNING → COMPLETE | FAILED
//! ```

mod context;
mod queue;
mod worker;
mod writer;

pub use context::build_context;
pub use queue::{ReportJob, ReportQueue};
pub use worker::{ReportWorker, recover_unfinished_reports};
pub use writer::{PublishGate, write_report};

use crate::db::repository::RepoError;
use uptime_engine::EngineError;

/// Report job error types
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Store {0} not found")]
    StoreNotFound(String),

    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Report job timed out after {0}s")]
    Timeout(u64),

    #[error("Report abandoned before publishing")]
    Abandoned,

    #[error("Report queue is closed")]
    QueueClosed,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ReportResult<T> = Result<T, ReportError>;
