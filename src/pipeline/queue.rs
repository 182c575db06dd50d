//! Background claim queue.
//!
//! Claims are submitted to a tokio channel and processed one at a time by a
//! worker task. Each claim moves `queued → processing → completed | failed`
//! exactly once; nothing is retried.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

use super::processor::{ClaimProcessor, ClaimReport, ClaimRequest, ProcessingError};
use crate::models::ProcessingStatus;

/// Default bound on claims waiting for the worker.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// Current state of one submitted claim.
#[derive(Debug, Clone, Serialize)]
pub struct ClaimRecord {
    pub claim_id: String,
    pub document_count: usize,
    pub status: ProcessingStatus,
    pub error: Option<String>,
    #[serde(skip)]
    pub report: Option<Arc<ClaimReport>>,
}

type Records = Arc<Mutex<HashMap<String, ClaimRecord>>>;

/// Whether `from → to` is a legal status change.
pub fn can_transition(from: ProcessingStatus, to: ProcessingStatus) -> bool {
    matches!(
        (from, to),
        (ProcessingStatus::Queued, ProcessingStatus::Processing)
            | (ProcessingStatus::Processing, ProcessingStatus::Completed)
            | (ProcessingStatus::Processing, ProcessingStatus::Failed)
    )
}

fn transition(
    records: &Records,
    claim_id: &str,
    to: ProcessingStatus,
    outcome: Option<Result<ClaimReport, String>>,
) -> Result<(), ProcessingError> {
    let mut guard = records
        .lock()
        .map_err(|_| ProcessingError::Queue("claim table poisoned".into()))?;
    let record = guard
        .get_mut(claim_id)
        .ok_or_else(|| ProcessingError::Queue(format!("unknown claim {claim_id}")))?;

    if !can_transition(record.status, to) {
        return Err(ProcessingError::InvalidTransition {
            claim_id: claim_id.to_string(),
            from: record.status,
            to,
        });
    }

    record.status = to;
    match outcome {
        Some(Ok(report)) => record.report = Some(Arc::new(report)),
        Some(Err(error)) => record.error = Some(error),
        None => {}
    }
    Ok(())
}

/// Handle to the claim queue and its worker task.
pub struct ClaimQueue {
    sender: mpsc::Sender<ClaimRequest>,
    records: Records,
    changed: Arc<Notify>,
    worker: JoinHandle<()>,
}

impl ClaimQueue {
    /// Spawn the worker on the current tokio runtime.
    pub fn start(processor: Arc<ClaimProcessor>, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let records: Records = Arc::new(Mutex::new(HashMap::new()));
        let changed = Arc::new(Notify::new());

        let worker = tokio::spawn(run_worker(processor, receiver, records.clone(), changed.clone()));
        tracing::info!(capacity, "Claim queue started");

        Self {
            sender,
            records,
            changed,
            worker,
        }
    }

    /// Queue a claim and return its id.
    pub async fn submit(&self, request: ClaimRequest) -> Result<String, ProcessingError> {
        let claim_id = request.claim_id.clone();
        {
            let mut guard = self
                .records
                .lock()
                .map_err(|_| ProcessingError::Queue("claim table poisoned".into()))?;
            if guard.contains_key(&claim_id) {
                return Err(ProcessingError::Queue(format!("claim {claim_id} already submitted")));
            }
            guard.insert(
                claim_id.clone(),
                ClaimRecord {
                    claim_id: claim_id.clone(),
                    document_count: request.files.len(),
                    status: ProcessingStatus::Queued,
                    error: None,
                    report: None,
                },
            );
        }

        if self.sender.send(request).await.is_err() {
            if let Ok(mut guard) = self.records.lock() {
                guard.remove(&claim_id);
            }
            return Err(ProcessingError::Queue("worker has stopped".into()));
        }

        tracing::info!(claim_id = %claim_id, "Claim queued for processing");
        Ok(claim_id)
    }

    pub fn status(&self, claim_id: &str) -> Option<ClaimRecord> {
        self.records.lock().ok()?.get(claim_id).cloned()
    }

    /// Remove a finished claim and hand back its record, report included.
    ///
    /// Claims still queued or processing are left in place and `None` is returned.
    pub fn take(&self, claim_id: &str) -> Option<ClaimRecord> {
        let mut guard = self.records.lock().ok()?;
        if !guard.get(claim_id)?.status.is_terminal() {
            return None;
        }
        let record = guard.remove(claim_id);
        tracing::debug!(claim_id = %claim_id, remaining = guard.len(), "Claim record released");
        record
    }

    /// Number of claims currently tracked, finished ones included.
    pub fn tracked(&self) -> usize {
        self.records.lock().map(|g| g.len()).unwrap_or(0)
    }

    /// Wait until the claim reaches a terminal status.
    pub async fn wait_for(&self, claim_id: &str) -> Result<ClaimRecord, ProcessingError> {
        loop {
            let notified = self.changed.notified();
            let record = self
                .status(claim_id)
                .ok_or_else(|| ProcessingError::Queue(format!("unknown claim {claim_id}")))?;
            if record.status.is_terminal() {
                return Ok(record);
            }
            notified.await;
        }
    }

    /// Stop accepting claims, let the worker drain what is queued, and wait for it.
    pub async fn shutdown(self) {
        drop(self.sender);
        if let Err(e) = self.worker.await {
            tracing::warn!(error = %e, "Claim worker ended abnormally");
        }
        tracing::info!("Claim queue shut down");
    }
}

async fn run_worker(
    processor: Arc<ClaimProcessor>,
    mut receiver: mpsc::Receiver<ClaimRequest>,
    records: Records,
    changed: Arc<Notify>,
) {
    while let Some(request) = receiver.recv().await {
        let claim_id = request.claim_id.clone();
        if let Err(e) = transition(&records, &claim_id, ProcessingStatus::Processing, None) {
            tracing::warn!(claim_id = %claim_id, error = %e, "Skipping claim");
            continue;
        }
        changed.notify_waiters();

        let worker_processor = processor.clone();
        let outcome = match tokio::task::spawn_blocking(move || worker_processor.process(&request)).await {
            Ok(Ok(report)) => Ok(report),
            Ok(Err(e)) => Err(e.to_string()),
            Err(join) => Err(format!("claim processing panicked: {join}")),
        };

        let to = match &outcome {
            Ok(_) => ProcessingStatus::Completed,
            Err(error) => {
                tracing::error!(claim_id = %claim_id, error = %error, "Claim processing failed");
                ProcessingStatus::Failed
            }
        };
        if let Err(e) = transition(&records, &claim_id, to, Some(outcome)) {
            tracing::warn!(claim_id = %claim_id, error = %e, "Could not record claim outcome");
        }
        changed.notify_waiters();
    }
    tracing::debug!("Claim worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processor::tests::{processor, tinnitus_request};

    #[test]
    fn only_forward_transitions_are_legal() {
        use ProcessingStatus::*;
        assert!(can_transition(Queued, Processing));
        assert!(can_transition(Processing, Completed));
        assert!(can_transition(Processing, Failed));
        assert!(!can_transition(Queued, Completed));
        assert!(!can_transition(Completed, Processing));
        assert!(!can_transition(Failed, Completed));
        assert!(!can_transition(Completed, Failed));
    }

    #[test]
    fn terminal_record_rejects_another_transition() {
        let records: Records = Arc::new(Mutex::new(HashMap::new()));
        records.lock().unwrap().insert(
            "c1".into(),
            ClaimRecord {
                claim_id: "c1".into(),
                document_count: 0,
                status: ProcessingStatus::Failed,
                error: Some("boom".into()),
                report: None,
            },
        );
        let err = transition(&records, "c1", ProcessingStatus::Completed, None).unwrap_err();
        assert!(matches!(
            err,
            ProcessingError::InvalidTransition {
                from: ProcessingStatus::Failed,
                to: ProcessingStatus::Completed,
                ..
            }
        ));
        assert_eq!(records.lock().unwrap()["c1"].error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn completes_a_claim() {
        let queue = ClaimQueue::start(Arc::new(processor()), DEFAULT_QUEUE_CAPACITY);
        let id = queue.submit(tinnitus_request()).await.unwrap();

        let record = queue.wait_for(&id).await.unwrap();
        assert_eq!(record.status, ProcessingStatus::Completed);
        assert_eq!(record.document_count, 2);
        assert!(record.error.is_none());
        assert!(record.report.unwrap().analysis.condition("tinnitus").is_some());
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn finished_claims_can_be_released() {
        let queue = ClaimQueue::start(Arc::new(processor()), 4);
        let id = queue.submit(tinnitus_request()).await.unwrap();
        queue.wait_for(&id).await.unwrap();
        assert_eq!(queue.tracked(), 1);

        let record = queue.take(&id).unwrap();
        assert_eq!(record.status, ProcessingStatus::Completed);
        let report = record.report.unwrap();
        assert_eq!(Arc::strong_count(&report), 1);
        assert_eq!(report.claim_id, id);

        assert_eq!(queue.tracked(), 0);
        assert!(queue.status(&id).is_none());
        assert!(queue.take(&id).is_none());
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn unfinished_claims_are_not_released() {
        let records: Records = Arc::new(Mutex::new(HashMap::new()));
        let (sender, _receiver) = mpsc::channel(1);
        let worker = tokio::spawn(async {});
        records.lock().unwrap().insert(
            "c1".into(),
            ClaimRecord {
                claim_id: "c1".into(),
                document_count: 1,
                status: ProcessingStatus::Processing,
                error: None,
                report: None,
            },
        );
        let queue = ClaimQueue {
            sender,
            records,
            changed: Arc::new(Notify::new()),
            worker,
        };

        assert!(queue.take("c1").is_none());
        assert_eq!(queue.status("c1").unwrap().status, ProcessingStatus::Processing);
        assert_eq!(queue.tracked(), 1);
    }

    #[tokio::test]
    async fn failed_claim_keeps_error_message() {
        let queue = ClaimQueue::start(Arc::new(processor()), 4);
        let request = ClaimRequest::new(vec![("notes.odt".into(), b"x".to_vec())], vec!["ptsd".into()]);
        let id = queue.submit(request).await.unwrap();

        let record = queue.wait_for(&id).await.unwrap();
        assert_eq!(record.status, ProcessingStatus::Failed);
        assert!(record.error.unwrap().contains("notes.odt"));
        assert!(record.report.is_none());
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn duplicate_and_unknown_claims_are_rejected() {
        let queue = ClaimQueue::start(Arc::new(processor()), 4);
        let request = tinnitus_request();
        queue.submit(request.clone()).await.unwrap();
        assert!(matches!(queue.submit(request).await, Err(ProcessingError::Queue(_))));
        assert!(queue.status("nope").is_none());
        assert!(queue.wait_for("nope").await.is_err());
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_drains_queued_claims() {
        let queue = ClaimQueue::start(Arc::new(processor()), 4);
        let first = queue.submit(tinnitus_request()).await.unwrap();
        let second = queue.submit(tinnitus_request()).await.unwrap();
        let records = queue.records.clone();
        queue.shutdown().await;

        let guard = records.lock().unwrap();
        assert!(guard[&first].status.is_terminal());
        assert!(guard[&second].status.is_terminal());
    }
}
