use async_trait::async_trait;
use common::{
    DEFAULT_AGENCY, DomainError, DomainResult, MaintenanceTask, PostgresClient, TaskMessage,
    with_table_prefix,
};
use std::time::Duration;
use tracing::{debug, instrument};

const AGENCY_BACKFILL_SQL: &str =
    "UPDATE #__applications SET agency = 1, agency_location = 1 WHERE agency IS NULL";

/// Backfills the default agency onto applications that predate agency
/// assignment. Rows already pointing at an agency are never touched, so the
/// update converges to a no-op once the backlog is repaired.
pub struct AgencyBackfillTask {
    client: PostgresClient,
    sql: String,
    stale_after: Duration,
}

impl AgencyBackfillTask {
    pub fn new(client: PostgresClient, table_prefix: &str, stale_after: Duration) -> Self {
        Self {
            client,
            sql: with_table_prefix(AGENCY_BACKFILL_SQL, table_prefix),
            stale_after,
        }
    }
}

#[async_trait]
impl MaintenanceTask for AgencyBackfillTask {
    fn name(&self) -> &'static str {
        "agency_backfill"
    }

    fn stale_after(&self) -> Duration {
        self.stale_after
    }

    #[instrument(skip(self, _message))]
    async fn run(&self, _message: &TaskMessage) -> DomainResult<u64> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let rows_affected = conn
            .execute(self.sql.as_str(), &[])
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        debug!(
            rows_affected,
            default_agency = DEFAULT_AGENCY,
            "backfilled default agency onto unassigned applications"
        );
        Ok(rows_affected)
    }
}
