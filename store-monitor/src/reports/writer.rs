//! CSV report output

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use uptime_engine::CalculationResult;

use super::{ReportError, ReportResult};

/// Shared between a job's blocking writer and its timeout.
///
/// Publishing (rename into place) and abandoning both happen under the same
/// lock: once [`abandon`](Self::abandon) returns, no report file exists at the
/// target and none will appear later.
#[derive(Debug, Clone, Default)]
pub struct PublishGate {
    abandoned: Arc<Mutex<bool>>,
}

impl PublishGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        // 锁内只有一次 rename / remove，poison 后状态依然可用
        self.abandoned.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Give up on the report and delete the file if it was already published
    pub fn abandon(&self, path: &Path) {
        let mut abandoned = self.lock();
        *abandoned = true;
        match fs::remove_file(path) {
            Ok(()) => tracing::warn!(file = %path.display(), "Removed report file of abandoned job"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::error!(file = %path.display(), error = %e, "Failed to remove report file"),
        }
    }

    pub fn is_abandoned(&self) -> bool {
        *self.lock()
    }

    /// Rename `staged` to `path` unless the job was abandoned
    fn publish(&self, staged: &Path, path: &Path) -> ReportResult<()> {
        let abandoned = self.lock();
        if *abandoned {
            let _ = fs::remove_file(staged);
            return Err(ReportError::Abandoned);
        }
        fs::rename(staged, path)?;
        Ok(())
    }
}

/// Write `row` with its header to `path`.
///
/// The file is written under a temporary name and renamed into place, so a
/// reader never sees a half-written report.
pub fn write_report(path: &Path, row: &CalculationResult, gate: &PublishGate) -> ReportResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let tmp = path.with_extension("csv.tmp");
    {
        let mut writer = csv::Writer::from_path(&tmp)?;
        writer.serialize(row)?;
        writer.flush()?;
    }
    gate.publish(&tmp, path)
}
