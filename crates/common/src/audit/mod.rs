//! Best-effort audit logging
//!
//! Chat turns are audited out-of-band: handlers enqueue an entry into a
//! bounded channel and a spawned writer task persists it. The caller never
//! awaits the write and never observes a failure; dropped entries and
//! failed writes are visible only through metrics and logs.

use crate::db::Repository;
use crate::metrics as app_metrics;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;
use uuid::Uuid;

/// One audit entry describing a chat turn
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub user_id: Uuid,
    pub message: String,
    pub response: String,
    pub actions: Vec<serde_json::Value>,
    pub results: Vec<serde_json::Value>,
    pub errors: Vec<String>,
}

impl AuditEntry {
    /// Structured action/result/error payload stored alongside the turn
    fn payload(&self) -> serde_json::Value {
        json!({
            "actions": self.actions,
            "results": self.results,
            "errors": self.errors,
        })
    }
}

/// Handle for enqueueing audit entries
#[derive(Clone)]
pub struct AuditLogger {
    tx: mpsc::Sender<AuditEntry>,
}

impl AuditLogger {
    /// Spawn the writer task and return the logger handle.
    ///
    /// The returned join handle is only useful for tests and shutdown
    /// diagnostics; the task ends when every logger handle is dropped.
    pub fn spawn(repo: Repository, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<AuditEntry>(capacity.max(1));

        let handle = tokio::spawn(async move {
            while let Some(entry) = rx.recv().await {
                let error = if entry.errors.is_empty() {
                    None
                } else {
                    Some(entry.errors.join("; "))
                };

                let payload = entry.payload();

                if let Err(e) = repo
                    .insert_audit_record(
                        entry.user_id,
                        entry.message,
                        entry.response,
                        payload,
                        error,
                    )
                    .await
                {
                    app_metrics::record_audit_failure("write");
                    warn!(error = %e, "Audit write failed");
                }
            }
        });

        (Self { tx }, handle)
    }

    /// Construct a logger backed by an existing channel sender.
    ///
    /// Used by tests to observe enqueued entries without a database.
    pub fn from_sender(tx: mpsc::Sender<AuditEntry>) -> Self {
        Self { tx }
    }

    /// Enqueue an entry without blocking. Infallible toward the caller:
    /// a full or closed channel drops the entry and bumps a counter.
    pub fn record(&self, entry: AuditEntry) {
        if let Err(e) = self.tx.try_send(entry) {
            app_metrics::record_audit_failure("dropped");
            warn!(error = %e, "Audit entry dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> AuditEntry {
        AuditEntry {
            user_id: Uuid::new_v4(),
            message: "hello".into(),
            response: "hi there".into(),
            actions: vec![json!({"name": "noop"})],
            results: vec![json!({"status": "ok"})],
            errors: vec![],
        }
    }

    #[tokio::test]
    async fn test_record_delivers_entry() {
        let (tx, mut rx) = mpsc::channel(4);
        let logger = AuditLogger::from_sender(tx);

        logger.record(entry());

        let received = rx.recv().await.unwrap();
        assert_eq!(received.message, "hello");
        assert_eq!(received.payload()["results"][0]["status"], "ok");
    }

    #[tokio::test]
    async fn test_record_never_errors_when_channel_full() {
        let (tx, _rx) = mpsc::channel(1);
        let logger = AuditLogger::from_sender(tx);

        // Second send overflows the bounded channel; both calls return
        logger.record(entry());
        logger.record(entry());
    }

    #[tokio::test]
    async fn test_record_never_errors_when_receiver_gone() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let logger = AuditLogger::from_sender(tx);

        logger.record(entry());
    }
}
