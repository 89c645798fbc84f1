use crate::domain::{DomainError, DomainResult, TaskMessage, TaskQueue};
use crate::nats::traits::{JetStreamConsumer, PullConsumer};
use anyhow::{Context, Result, anyhow};
use async_nats::jetstream;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Header carrying the producer-side publish time as epoch milliseconds.
pub const SENT_TIMESTAMP_HEADER: &str = "Sent-Timestamp";

/// JetStream-backed implementation of the TaskQueue trait.
///
/// Fetched messages are handed out as [`TaskMessage`]s with a generated
/// receipt handle; the underlying JetStream message is parked until
/// [`TaskQueue::delete`] acknowledges it. A message whose receipt is never
/// deleted is redelivered by the broker after its ack wait, which is the
/// at-least-once behavior the maintenance tasks are written for.
pub struct NatsTaskQueue {
    consumer: Box<dyn PullConsumer>,
    pending: Mutex<HashMap<String, jetstream::Message>>,
}

impl NatsTaskQueue {
    /// Create a durable pull consumer for one task subject
    pub async fn new(
        jetstream: Arc<dyn JetStreamConsumer>,
        stream_name: &str,
        consumer_name: &str,
        subject_filter: &str,
    ) -> Result<Self> {
        debug!(
            stream = %stream_name,
            consumer = %consumer_name,
            filter_subject = %subject_filter,
            "creating task queue consumer"
        );

        let config = jetstream::consumer::pull::Config {
            name: Some(consumer_name.to_string()),
            durable_name: Some(consumer_name.to_string()),
            filter_subject: subject_filter.to_string(),
            ack_policy: jetstream::consumer::AckPolicy::Explicit,
            ..Default::default()
        };

        let consumer = jetstream
            .create_consumer(config, stream_name)
            .await
            .context("failed to create task queue consumer")?;

        Ok(Self {
            consumer,
            pending: Mutex::new(HashMap::new()),
        })
    }
}

#[async_trait]
impl TaskQueue for NatsTaskQueue {
    async fn receive(&self, max_messages: usize, wait: Duration) -> DomainResult<Vec<TaskMessage>> {
        let raw_messages = self
            .consumer
            .fetch_messages(max_messages, wait)
            .await
            .map_err(DomainError::QueueError)?;

        let mut messages = Vec::with_capacity(raw_messages.len());
        let mut pending = self.pending.lock().await;
        for raw in raw_messages {
            let receipt_handle = xid::new().to_string();
            let message = TaskMessage {
                receipt_handle: receipt_handle.clone(),
                sent_at: sent_timestamp(&raw),
                body: String::from_utf8_lossy(&raw.payload).into_owned(),
            };
            pending.insert(receipt_handle, raw);
            messages.push(message);
        }

        Ok(messages)
    }

    async fn delete(&self, receipt_handle: &str) -> DomainResult<()> {
        let message = self
            .pending
            .lock()
            .await
            .remove(receipt_handle)
            .ok_or_else(|| DomainError::UnknownReceiptHandle(receipt_handle.to_string()))?;

        message
            .ack()
            .await
            .map_err(|e| DomainError::QueueError(anyhow!("failed to acknowledge message: {}", e)))
    }
}

/// Resolve the producer-side publish time of a JetStream message.
///
/// Producers stamp the Sent-Timestamp header; when the header is missing or
/// unparseable the broker publish time is used, and as a last resort the
/// message is treated as just sent so it is never spuriously discarded as
/// stale.
fn sent_timestamp(message: &jetstream::Message) -> DateTime<Utc> {
    if let Some(header) = message
        .headers
        .as_ref()
        .and_then(|headers| headers.get(SENT_TIMESTAMP_HEADER))
    {
        if let Ok(millis) = header.as_str().parse::<i64>() {
            if let Some(sent_at) = DateTime::from_timestamp_millis(millis) {
                return sent_at;
            }
        }
        warn!(
            header = %header.as_str(),
            "unparseable Sent-Timestamp header, falling back to broker publish time"
        );
    }

    match message.info() {
        Ok(info) => {
            let nanos = info.published.unix_timestamp_nanos();
            DateTime::from_timestamp_millis((nanos / 1_000_000) as i64)
                .unwrap_or_else(Utc::now)
        }
        Err(e) => {
            warn!(error = %e, "message has no JetStream info, treating as just sent");
            Utc::now()
        }
    }
}

// Note: receive/delete conversion is not unit tested here because
// jetstream::Message cannot be constructed without a real NATS connection.
// The consumer loop is tested against MockTaskQueue in maintenance_worker,
// and this adapter is covered by integration tests with real infrastructure.
