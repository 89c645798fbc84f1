use crate::domain::{ApplicationDraft, ApplicationRepository, DomainError, DomainResult};
use crate::postgres::{PostgresClient, with_table_prefix};
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, instrument};

const GET_DRAFT_SQL: &str =
    "SELECT draft FROM #__application_drafts WHERE application_id = $1";

const UPSERT_DRAFT_SQL: &str = "INSERT INTO #__application_drafts \
     (application_id, draft, created_at, updated_at) \
     VALUES ($1, $2, $3, $3) \
     ON CONFLICT (application_id) \
     DO UPDATE SET draft = EXCLUDED.draft, updated_at = EXCLUDED.updated_at";

/// PostgreSQL implementation of ApplicationRepository
///
/// Drafts are stored whole as JSONB keyed by application id. Statements are
/// rendered once at construction with the deployment table prefix.
#[derive(Clone)]
pub struct PostgresApplicationRepository {
    client: PostgresClient,
    get_draft_sql: String,
    upsert_draft_sql: String,
}

impl PostgresApplicationRepository {
    pub fn new(client: PostgresClient, table_prefix: &str) -> Self {
        Self {
            client,
            get_draft_sql: with_table_prefix(GET_DRAFT_SQL, table_prefix),
            upsert_draft_sql: with_table_prefix(UPSERT_DRAFT_SQL, table_prefix),
        }
    }
}

#[async_trait]
impl ApplicationRepository for PostgresApplicationRepository {
    #[instrument(skip(self))]
    async fn get_draft(&self, application_id: &str) -> DomainResult<Option<ApplicationDraft>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(self.get_draft_sql.as_str(), &[&application_id])
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        match row {
            Some(row) => {
                let value: serde_json::Value = row.get(0);
                let draft = serde_json::from_value(value)
                    .map_err(|e| DomainError::RepositoryError(e.into()))?;
                debug!("found draft for application: {}", application_id);
                Ok(Some(draft))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, draft))]
    async fn upsert_draft(
        &self,
        application_id: &str,
        draft: &ApplicationDraft,
    ) -> DomainResult<()> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let value = serde_json::to_value(draft)
            .map_err(|e| DomainError::RepositoryError(e.into()))?;
        let now = Utc::now();

        conn.execute(
            self.upsert_draft_sql.as_str(),
            &[&application_id, &value, &now],
        )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        debug!("stored draft for application: {}", application_id);
        Ok(())
    }
}
