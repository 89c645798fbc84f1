use chrono::Utc;
use common::{MaintenanceTask, TaskMessage};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// What the dispatcher did with one message. Every variant ends with the
/// message being deleted by the consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskDisposition {
    /// Task ran; update applied
    Processed { rows_affected: u64 },
    /// Task ran and failed; the failure is logged only
    ProcessedWithError,
    /// Message was older than the task's threshold; task did not run
    Discarded,
}

/// Per-message state machine shared by all maintenance tasks.
///
/// A message younger than the task's staleness threshold gets exactly one
/// task run; an older one is discarded without running anything. Update
/// failures never change the outcome: the consumer deletes the message
/// either way, and redelivery after a missed delete is safe because every
/// task body is idempotent.
pub struct TaskDispatcher {
    task: Arc<dyn MaintenanceTask>,
}

impl TaskDispatcher {
    pub fn new(task: Arc<dyn MaintenanceTask>) -> Self {
        Self { task }
    }

    pub fn task_name(&self) -> &'static str {
        self.task.name()
    }

    pub async fn dispatch(&self, message: &TaskMessage) -> TaskDisposition {
        let age = message.age(Utc::now());
        let stale_after = chrono::Duration::from_std(self.task.stale_after())
            .unwrap_or(chrono::Duration::MAX);

        if age >= stale_after {
            warn!(
                task = self.task.name(),
                age_secs = age.num_seconds(),
                threshold_secs = stale_after.num_seconds(),
                "dropping stale maintenance message"
            );
            return TaskDisposition::Discarded;
        }

        match self.task.run(message).await {
            Ok(rows_affected) => {
                debug!(
                    task = self.task.name(),
                    rows_affected, "maintenance task completed"
                );
                TaskDisposition::Processed { rows_affected }
            }
            Err(e) => {
                error!(
                    task = self.task.name(),
                    error = %e,
                    "maintenance task failed; message will still be deleted"
                );
                TaskDisposition::ProcessedWithError
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use common::{DomainError, MockMaintenanceTask};
    use std::time::Duration;

    fn message_aged(seconds: i64) -> TaskMessage {
        TaskMessage {
            receipt_handle: "r-1".to_string(),
            sent_at: Utc::now() - ChronoDuration::seconds(seconds),
            body: "{}".to_string(),
        }
    }

    #[tokio::test]
    async fn test_stale_message_is_discarded_without_running_task() {
        // Arrange
        let mut mock_task = MockMaintenanceTask::new();
        mock_task.expect_name().return_const("expire_policies");
        mock_task
            .expect_stale_after()
            .return_const(Duration::from_secs(30));
        mock_task.expect_run().times(0);

        let dispatcher = TaskDispatcher::new(Arc::new(mock_task));

        // Act
        let disposition = dispatcher.dispatch(&message_aged(31)).await;

        // Assert
        assert_eq!(disposition, TaskDisposition::Discarded);
    }

    #[tokio::test]
    async fn test_fresh_message_runs_task_exactly_once() {
        // Arrange
        let mut mock_task = MockMaintenanceTask::new();
        mock_task.expect_name().return_const("expire_policies");
        mock_task
            .expect_stale_after()
            .return_const(Duration::from_secs(30));
        mock_task.expect_run().times(1).returning(|_| Ok(12));

        let dispatcher = TaskDispatcher::new(Arc::new(mock_task));

        // Act
        let disposition = dispatcher.dispatch(&message_aged(5)).await;

        // Assert
        assert_eq!(disposition, TaskDisposition::Processed { rows_affected: 12 });
    }

    #[tokio::test]
    async fn test_update_failure_is_still_a_processed_outcome() {
        // Arrange
        let mut mock_task = MockMaintenanceTask::new();
        mock_task.expect_name().return_const("checkin_records");
        mock_task
            .expect_stale_after()
            .return_const(Duration::from_secs(1800));
        mock_task.expect_run().times(1).returning(|_| {
            Err(DomainError::RepositoryError(anyhow::anyhow!(
                "connection refused"
            )))
        });

        let dispatcher = TaskDispatcher::new(Arc::new(mock_task));

        // Act
        let disposition = dispatcher.dispatch(&message_aged(0)).await;

        // Assert
        assert_eq!(disposition, TaskDisposition::ProcessedWithError);
    }

    #[tokio::test]
    async fn test_future_sent_timestamp_counts_as_fresh() {
        // Clock skew between producer and consumer must not discard work
        let mut mock_task = MockMaintenanceTask::new();
        mock_task.expect_name().return_const("agency_backfill");
        mock_task
            .expect_stale_after()
            .return_const(Duration::from_secs(10));
        mock_task.expect_run().times(1).returning(|_| Ok(0));

        let dispatcher = TaskDispatcher::new(Arc::new(mock_task));

        let disposition = dispatcher.dispatch(&message_aged(-5)).await;
        assert_eq!(disposition, TaskDisposition::Processed { rows_affected: 0 });
    }
}
