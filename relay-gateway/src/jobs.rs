//! Deferred-work queue over the KV seam.
//!
//! Jobs are idempotent: each carries an operation kind and a target id, and
//! executing the same job twice is safe (expiry transitions and settlement
//! retries all guard on current state). Re-delivery is therefore harmless.

use crate::kv::KvStore;
use relay_core::now_unix;
use relay_core::Error;
use serde::Deserialize;
use serde::Serialize;
use std::sync::Arc;

const QUEUE_KEY: &str = "gateway:jobs";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Re-check an expired session and apply compensation.
    SweepSession,
    /// Poll a pending invoice by payment hash.
    PollInvoice,
    /// Retry settlement of a paid lift invoice.
    RetrySettlement,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub kind: JobKind,
    /// Session id or payment hash, depending on the kind.
    pub target: String,
    pub enqueued_at: i64,
}

impl Job {
    pub fn new(kind: JobKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            enqueued_at: now_unix(),
        }
    }

    /// Stable identity of the operation, independent of when it was queued.
    pub fn operation_key(&self) -> String {
        let kind = match self.kind {
            JobKind::SweepSession => "sweep_session",
            JobKind::PollInvoice => "poll_invoice",
            JobKind::RetrySettlement => "retry_settlement",
        };
        format!("{kind}:{}", self.target)
    }
}

#[derive(Clone)]
pub struct JobQueue {
    kv: Arc<dyn KvStore>,
}

impl JobQueue {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    pub async fn enqueue(&self, job: Job) -> Result<(), Error> {
        let serialized = serde_json::to_string(&job)
            .map_err(|e| Error::ad_hoc(format!("failed to serialize job: {e}")))?;
        let depth = self.kv.lpush(QUEUE_KEY, serialized).await?;

        tracing::debug!(operation = %job.operation_key(), depth, "Enqueued job");

        Ok(())
    }

    pub async fn dequeue(&self) -> Result<Option<Job>, Error> {
        let Some(raw) = self.kv.rpop(QUEUE_KEY).await? else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| Error::ad_hoc(format!("corrupt job in queue: {e}")))
    }
}
