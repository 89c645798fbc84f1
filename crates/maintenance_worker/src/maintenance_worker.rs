use crate::domain::{AgencyBackfillTask, CheckinRecordsTask, ExpirePoliciesTask, TaskDispatcher};
use crate::nats::MaintenanceConsumer;
use common::{MaintenanceTask, NatsClient, NatsTaskQueue, PostgresClient};
use quoria_runner::AppProcess;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct MaintenanceWorkerConfig {
    pub stream: String,
    pub batch_size: usize,
    pub batch_wait_secs: u64,
    pub table_prefix: String,
    /// Per-task staleness thresholds, in seconds. Each task keeps its own
    /// threshold; they are deliberately not unified.
    pub expire_policies_stale_secs: u64,
    pub checkin_records_stale_secs: u64,
    pub agency_backfill_stale_secs: u64,
}

/// Wires every maintenance task to a durable consumer on the maintenance
/// stream, one subject per task.
pub struct MaintenanceWorker {
    consumers: Vec<(&'static str, MaintenanceConsumer)>,
}

impl MaintenanceWorker {
    pub async fn new(
        postgres_client: PostgresClient,
        nats_client: Arc<NatsClient>,
        config: MaintenanceWorkerConfig,
    ) -> anyhow::Result<Self> {
        info!("Initializing maintenance worker");

        let tasks: Vec<Arc<dyn MaintenanceTask>> = vec![
            Arc::new(ExpirePoliciesTask::new(
                postgres_client.clone(),
                &config.table_prefix,
                Duration::from_secs(config.expire_policies_stale_secs),
            )),
            Arc::new(CheckinRecordsTask::new(
                postgres_client.clone(),
                &config.table_prefix,
                Duration::from_secs(config.checkin_records_stale_secs),
            )),
            Arc::new(AgencyBackfillTask::new(
                postgres_client,
                &config.table_prefix,
                Duration::from_secs(config.agency_backfill_stale_secs),
            )),
        ];

        let mut consumers = Vec::with_capacity(tasks.len());
        for task in tasks {
            let name = task.name();
            let queue = NatsTaskQueue::new(
                nats_client.create_consumer_client(),
                &config.stream,
                &format!("maintenance-{}", name),
                &format!("{}.{}", config.stream, name),
            )
            .await?;

            consumers.push((
                name,
                MaintenanceConsumer::new(
                    Arc::new(queue),
                    TaskDispatcher::new(task),
                    config.batch_size,
                    config.batch_wait_secs,
                ),
            ));
        }

        info!("Maintenance worker initialized");
        Ok(Self { consumers })
    }

    /// Hand each task consumer to the runner as a named process
    pub fn into_runner_processes(self) -> Vec<(&'static str, AppProcess)> {
        self.consumers
            .into_iter()
            .map(|(name, consumer)| {
                let process: AppProcess =
                    Box::new(move |ctx| Box::pin(async move { consumer.run(ctx).await }));
                (name, process)
            })
            .collect()
    }
}
