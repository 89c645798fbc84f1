use async_trait::async_trait;
use common::{
    DomainError, DomainResult, MaintenanceTask, PostgresClient, TaskMessage, with_table_prefix,
};
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Entity tables using the optimistic checkout lock.
pub const CHECKOUT_TABLES: [&str; 4] = ["applications", "agencies", "agency_locations", "quotes"];

/// Releases abandoned checkout locks.
///
/// Portal sessions mark a row checked out while an agent edits it; a crashed
/// session leaves the flag set forever. This sweep resets every nonzero
/// `checked_out` back to 0 and clears the checkout timestamp. A failure on
/// one table is logged and the sweep continues with the rest.
pub struct CheckinRecordsTask {
    client: PostgresClient,
    statements: Vec<(&'static str, String)>,
    stale_after: Duration,
}

impl CheckinRecordsTask {
    pub fn new(client: PostgresClient, table_prefix: &str, stale_after: Duration) -> Self {
        let statements = CHECKOUT_TABLES
            .iter()
            .map(|table| {
                let sql = format!(
                    "UPDATE #__{} SET checked_out = 0, checked_out_time = NULL WHERE checked_out != 0",
                    table
                );
                (*table, with_table_prefix(&sql, table_prefix))
            })
            .collect();

        Self {
            client,
            statements,
            stale_after,
        }
    }
}

#[async_trait]
impl MaintenanceTask for CheckinRecordsTask {
    fn name(&self) -> &'static str {
        "checkin_records"
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

        let mut rows_affected = 0;
        for (table, sql) in &self.statements {
            match conn.execute(sql.as_str(), &[]).await {
                Ok(rows) => {
                    if rows > 0 {
                        debug!(table, rows, "released abandoned checkouts");
                    }
                    rows_affected += rows;
                }
                Err(e) => {
                    error!(table, error = %e, "checkout sweep failed for table, continuing");
                }
            }
        }

        Ok(rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::PostgresConfig;

    #[test]
    fn test_one_statement_per_checkout_table() {
        let client = PostgresClient::new(&PostgresConfig::default()).unwrap();
        let task = CheckinRecordsTask::new(client, "quoria_", Duration::from_secs(1800));

        assert_eq!(task.statements.len(), CHECKOUT_TABLES.len());
        assert_eq!(
            task.statements[0].1,
            "UPDATE quoria_applications SET checked_out = 0, checked_out_time = NULL WHERE checked_out != 0"
        );
        assert!(
            task.statements
                .iter()
                .any(|(table, _)| *table == "agency_locations")
        );
        assert_eq!(task.name(), "checkin_records");
    }
}
