use async_trait::async_trait;
use common::{
    DomainError, DomainResult, MaintenanceTask, PostgresClient, TaskMessage, with_table_prefix,
};
use std::time::Duration;
use tracing::{debug, instrument};

const EXPIRE_POLICIES_SQL: &str =
    "UPDATE #__policies SET state = 0 WHERE state = 1 AND expiration_date < NOW()";

/// Deactivates policies whose expiration date has passed.
///
/// The WHERE clause only matches still-active, already-expired rows, so a
/// redelivered message re-applies a no-op. There is no other coordination
/// between concurrent workers.
pub struct ExpirePoliciesTask {
    client: PostgresClient,
    sql: String,
    stale_after: Duration,
}

impl ExpirePoliciesTask {
    pub fn new(client: PostgresClient, table_prefix: &str, stale_after: Duration) -> Self {
        Self {
            client,
            sql: with_table_prefix(EXPIRE_POLICIES_SQL, table_prefix),
            stale_after,
        }
    }
}

#[async_trait]
impl MaintenanceTask for ExpirePoliciesTask {
    fn name(&self) -> &'static str {
        "expire_policies"
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

        debug!(rows_affected, "deactivated policies past expiration");
        Ok(rows_affected)
    }
}
