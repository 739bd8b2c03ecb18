//! Report job queue

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::{ReportError, ReportResult};

/// Jobs buffered before `submit` waits for the worker
const QUEUE_CAPACITY: usize = 256;

/// One report to generate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportJob {
    pub report_id: String,
    pub store_id: String,
    /// Batch reference instant captured when the report was triggered
    pub reference: DateTime<Utc>,
}

/// Sending side of the job channel, shared by HTTP handlers
#[derive(Debug, Clone)]
pub struct ReportQueue {
    tx: mpsc::Sender<ReportJob>,
}

impl ReportQueue {
    /// Create the queue and the receiver handed to [`super::ReportWorker::run`]
    pub fn new() -> (Self, mpsc::Receiver<ReportJob>) {
        Self::with_capacity(QUEUE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<ReportJob>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    pub async fn submit(&self, job: ReportJob) -> ReportResult<()> {
        tracing::debug!(report_id = %job.report_id, store_id = %job.store_id, "Report job queued");
        self.tx.send(job).await.map_err(|_| ReportError::QueueClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: &str) -> ReportJob {
        ReportJob {
            report_id: id.into(),
            store_id: "s".into(),
            reference: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_submit_delivers_in_order() {
        let (queue, mut rx) = ReportQueue::with_capacity(4);
        queue.submit(job("a")).await.unwrap();
        queue.submit(job("b")).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().report_id, "a");
        assert_eq!(rx.recv().await.unwrap().report_id, "b");
    }

    #[tokio::test]
    async fn test_submit_fails_when_worker_gone() {
        let (queue, rx) = ReportQueue::with_capacity(1);
        drop(rx);
        assert!(matches!(
            queue.submit(job("a")).await,
            Err(ReportError::QueueClosed)
        ));
    }
}
