use crate::domain::result::DomainResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// One maintenance message pulled off the queue.
///
/// Messages are never mutated; a consumer either processes and deletes one
/// or discards it as stale. `receipt_handle` is the opaque token the queue
/// hands out for deletion.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskMessage {
    pub receipt_handle: String,
    /// Producer-side publish time, taken from the Sent-Timestamp header.
    pub sent_at: DateTime<Utc>,
    /// Task-specific JSON body.
    pub body: String,
}

impl TaskMessage {
    /// Age of the message relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.sent_at)
    }
}

/// Trait implemented by each concrete maintenance task.
///
/// A task owns exactly two things: its staleness threshold and its bulk
/// update. The dispatch state machine (age check, acknowledge-regardless)
/// is shared and lives in the worker.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MaintenanceTask: Send + Sync {
    /// Queue-facing task name, also the consumer subject suffix.
    fn name(&self) -> &'static str;

    /// Messages older than this are discarded without running the task.
    fn stale_after(&self) -> Duration;

    /// Execute the task's bulk update. Returns the affected row count.
    ///
    /// Updates must be idempotent: redelivery after a failed acknowledge
    /// re-runs them against already-fixed rows.
    async fn run(&self, message: &TaskMessage) -> DomainResult<u64>;
}

/// Trait for receiving and deleting maintenance messages
/// Infrastructure layer (NATS JetStream) implements this trait
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Fetch up to `max_messages` messages, waiting up to `wait`
    async fn receive(&self, max_messages: usize, wait: Duration) -> DomainResult<Vec<TaskMessage>>;

    /// Delete a message by receipt handle so it is not redelivered
    async fn delete(&self, receipt_handle: &str) -> DomainResult<()>;
}
