use crate::domain::{DomainError, DomainResult};
use crate::nats::task_queue::SENT_TIMESTAMP_HEADER;
use crate::nats::traits::JetStreamPublisher;
use anyhow::Context;
use async_nats::HeaderMap;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

/// Publisher for maintenance task messages.
///
/// Every published message carries the Sent-Timestamp header (epoch
/// milliseconds) that consumers use for the staleness check, and a
/// task-specific JSON body.
pub struct MaintenanceTaskProducer {
    jetstream: Arc<dyn JetStreamPublisher>,
    base_subject: String,
}

impl MaintenanceTaskProducer {
    pub fn new(jetstream: Arc<dyn JetStreamPublisher>, base_subject: String) -> Self {
        info!(
            "Created MaintenanceTaskProducer with base subject: {}",
            base_subject
        );
        Self {
            jetstream,
            base_subject,
        }
    }

    /// Publish one task message to `{base_subject}.{task_name}`
    pub async fn publish_task(
        &self,
        task_name: &str,
        body: &serde_json::Value,
    ) -> DomainResult<()> {
        let subject = format!("{}.{}", self.base_subject, task_name);

        let mut headers = HeaderMap::new();
        headers.insert(
            SENT_TIMESTAMP_HEADER,
            Utc::now().timestamp_millis().to_string().as_str(),
        );

        let payload = serde_json::to_vec(body)
            .map_err(|e| DomainError::ValidationError(format!("unserializable task body: {}", e)))?;

        debug!(
            subject = %subject,
            task = %task_name,
            size_bytes = payload.len(),
            "Publishing maintenance task message"
        );

        self.jetstream
            .publish(subject.clone(), headers, payload.into())
            .await
            .context("Failed to publish and acknowledge message")
            .map_err(DomainError::QueueError)?;

        info!(
            subject = %subject,
            task = %task_name,
            "Successfully published maintenance task message"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nats::traits::MockJetStreamPublisher;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_publish_task_sets_subject_and_timestamp_header() {
        // Arrange
        let mut mock_jetstream = MockJetStreamPublisher::new();

        mock_jetstream
            .expect_publish()
            .withf(|subject: &String, headers: &HeaderMap, payload: &Bytes| {
                subject == "maintenance_tasks.expire_policies"
                    && headers.get(SENT_TIMESTAMP_HEADER).is_some()
                    && payload.as_ref() == b"{\"task\":\"expire_policies\"}"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let producer = MaintenanceTaskProducer::new(
            Arc::new(mock_jetstream),
            "maintenance_tasks".to_string(),
        );

        // Act
        let result = producer
            .publish_task(
                "expire_policies",
                &serde_json::json!({"task": "expire_policies"}),
            )
            .await;

        // Assert
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_publish_task_failure() {
        // Arrange
        let mut mock_jetstream = MockJetStreamPublisher::new();

        mock_jetstream
            .expect_publish()
            .times(1)
            .returning(|_, _, _| Err(anyhow::anyhow!("NATS publish failed")));

        let producer = MaintenanceTaskProducer::new(
            Arc::new(mock_jetstream),
            "maintenance_tasks".to_string(),
        );

        // Act
        let result = producer
            .publish_task("checkin_records", &serde_json::json!({}))
            .await;

        // Assert
        assert!(matches!(result, Err(DomainError::QueueError(_))));
    }
}
