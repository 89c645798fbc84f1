use crate::domain::TaskDispatcher;
use anyhow::Result;
use common::TaskQueue;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Poll loop binding one maintenance task to its queue.
///
/// Every received message is dispatched and then deleted, whatever the
/// dispatch outcome: a processed message must not be redelivered, and a
/// stale one must not linger. A failed delete is logged and never retried;
/// the broker redelivers and the idempotent task body absorbs the repeat.
pub struct MaintenanceConsumer {
    queue: Arc<dyn TaskQueue>,
    dispatcher: TaskDispatcher,
    batch_size: usize,
    max_wait: Duration,
}

impl MaintenanceConsumer {
    pub fn new(
        queue: Arc<dyn TaskQueue>,
        dispatcher: TaskDispatcher,
        batch_size: usize,
        max_wait_secs: u64,
    ) -> Self {
        Self {
            queue,
            dispatcher,
            batch_size,
            max_wait: Duration::from_secs(max_wait_secs),
        }
    }

    /// Run the consumer loop until cancellation
    pub async fn run(self, ctx: CancellationToken) -> Result<()> {
        debug!(task = self.dispatcher.task_name(), "starting maintenance consumer");

        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    info!(
                        task = self.dispatcher.task_name(),
                        "received shutdown signal, stopping consumer"
                    );
                    break;
                }
                result = self.poll_once() => {
                    if let Err(e) = result {
                        error!(
                            task = self.dispatcher.task_name(),
                            error = %e,
                            "error polling task queue"
                        );
                        // Continue polling despite errors
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        }

        debug!(task = self.dispatcher.task_name(), "consumer stopped gracefully");
        Ok(())
    }

    async fn poll_once(&self) -> Result<()> {
        let messages = self.queue.receive(self.batch_size, self.max_wait).await?;

        if messages.is_empty() {
            debug!(task = self.dispatcher.task_name(), "no messages in batch");
            return Ok(());
        }

        debug!(
            task = self.dispatcher.task_name(),
            message_count = messages.len(),
            "received message batch"
        );

        for message in messages {
            let disposition = self.dispatcher.dispatch(&message).await;
            debug!(
                task = self.dispatcher.task_name(),
                disposition = ?disposition,
                "message dispatched"
            );

            // Delete whatever happened; see TaskDisposition
            if let Err(e) = self.queue.delete(&message.receipt_handle).await {
                error!(
                    task = self.dispatcher.task_name(),
                    receipt_handle = %message.receipt_handle,
                    error = %e,
                    "failed to delete maintenance message"
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::{DomainError, MockMaintenanceTask, MockTaskQueue, TaskMessage};
    use mockall::predicate::eq;

    fn fresh_message(receipt_handle: &str) -> TaskMessage {
        TaskMessage {
            receipt_handle: receipt_handle.to_string(),
            sent_at: Utc::now(),
            body: "{}".to_string(),
        }
    }

    fn stale_message(receipt_handle: &str, age_secs: i64) -> TaskMessage {
        TaskMessage {
            receipt_handle: receipt_handle.to_string(),
            sent_at: Utc::now() - chrono::Duration::seconds(age_secs),
            body: "{}".to_string(),
        }
    }

    fn mock_task(threshold_secs: u64) -> MockMaintenanceTask {
        let mut task = MockMaintenanceTask::new();
        task.expect_name().return_const("expire_policies");
        task.expect_stale_after()
            .return_const(Duration::from_secs(threshold_secs));
        task
    }

    #[tokio::test]
    async fn test_fresh_message_runs_then_deletes() {
        // Arrange
        let mut task = mock_task(30);
        task.expect_run().times(1).returning(|_| Ok(3));

        let mut queue = MockTaskQueue::new();
        queue
            .expect_receive()
            .times(1)
            .returning(|_, _| Ok(vec![fresh_message("r-1")]));
        queue
            .expect_delete()
            .with(eq("r-1"))
            .times(1)
            .returning(|_| Ok(()));

        let consumer = MaintenanceConsumer::new(
            Arc::new(queue),
            TaskDispatcher::new(Arc::new(task)),
            10,
            5,
        );

        // Act / Assert
        consumer.poll_once().await.unwrap();
    }

    #[tokio::test]
    async fn test_stale_message_deletes_without_running_task() {
        // Arrange
        let mut task = mock_task(30);
        task.expect_run().times(0);

        let mut queue = MockTaskQueue::new();
        queue
            .expect_receive()
            .times(1)
            .returning(|_, _| Ok(vec![stale_message("r-2", 120)]));
        queue
            .expect_delete()
            .with(eq("r-2"))
            .times(1)
            .returning(|_| Ok(()));

        let consumer = MaintenanceConsumer::new(
            Arc::new(queue),
            TaskDispatcher::new(Arc::new(task)),
            10,
            5,
        );

        // Act / Assert
        consumer.poll_once().await.unwrap();
    }

    #[tokio::test]
    async fn test_update_failure_still_deletes_message() {
        // Arrange
        let mut task = mock_task(30);
        task.expect_run().times(1).returning(|_| {
            Err(DomainError::RepositoryError(anyhow::anyhow!(
                "deadlock detected"
            )))
        });

        let mut queue = MockTaskQueue::new();
        queue
            .expect_receive()
            .times(1)
            .returning(|_, _| Ok(vec![fresh_message("r-3")]));
        queue
            .expect_delete()
            .with(eq("r-3"))
            .times(1)
            .returning(|_| Ok(()));

        let consumer = MaintenanceConsumer::new(
            Arc::new(queue),
            TaskDispatcher::new(Arc::new(task)),
            10,
            5,
        );

        // Act / Assert
        consumer.poll_once().await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_failure_is_logged_not_retried() {
        // Arrange
        let mut task = mock_task(30);
        task.expect_run().times(1).returning(|_| Ok(0));

        let mut queue = MockTaskQueue::new();
        queue
            .expect_receive()
            .times(1)
            .returning(|_, _| Ok(vec![fresh_message("r-4")]));
        // Exactly one delete attempt even though it fails
        queue.expect_delete().times(1).returning(|_| {
            Err(DomainError::QueueError(anyhow::anyhow!(
                "consumer deleted on server"
            )))
        });

        let consumer = MaintenanceConsumer::new(
            Arc::new(queue),
            TaskDispatcher::new(Arc::new(task)),
            10,
            5,
        );

        // Act / Assert - the poll itself still succeeds
        consumer.poll_once().await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_noop() {
        let task = mock_task(30);

        let mut queue = MockTaskQueue::new();
        queue.expect_receive().times(1).returning(|_, _| Ok(vec![]));
        queue.expect_delete().times(0);

        let consumer = MaintenanceConsumer::new(
            Arc::new(queue),
            TaskDispatcher::new(Arc::new(task)),
            10,
            5,
        );

        consumer.poll_once().await.unwrap();
    }

    #[tokio::test]
    async fn test_each_message_in_batch_handled_independently() {
        // One fresh, one stale: the task runs once, both messages deleted
        let mut task = mock_task(30);
        task.expect_run().times(1).returning(|_| Ok(1));

        let mut queue = MockTaskQueue::new();
        queue
            .expect_receive()
            .times(1)
            .returning(|_, _| Ok(vec![fresh_message("r-5"), stale_message("r-6", 600)]));
        queue.expect_delete().times(2).returning(|_| Ok(()));

        let consumer = MaintenanceConsumer::new(
            Arc::new(queue),
            TaskDispatcher::new(Arc::new(task)),
            10,
            5,
        );

        consumer.poll_once().await.unwrap();
    }

    #[tokio::test]
    async fn test_receive_error_propagates_to_poll() {
        let task = mock_task(30);

        let mut queue = MockTaskQueue::new();
        queue.expect_receive().times(1).returning(|_, _| {
            Err(DomainError::QueueError(anyhow::anyhow!("fetch timed out")))
        });

        let consumer = MaintenanceConsumer::new(
            Arc::new(queue),
            TaskDispatcher::new(Arc::new(task)),
            10,
            5,
        );

        assert!(consumer.poll_once().await.is_err());
    }
}
