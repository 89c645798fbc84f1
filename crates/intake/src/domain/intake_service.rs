use crate::domain::bind_request_step::{BindRequestStepPayload, normalize_bind_request_step};
use crate::domain::claim_step::{ClaimStepPayload, normalize_claim_step};
use crate::domain::contact_step::{ContactStepPayload, normalize_contact_step};
use crate::domain::outcome::{SoftFailure, StepOutcome};
use crate::domain::owner_step::{OwnerStepPayload, normalize_owner_step};
use common::{ApplicationDraft, ApplicationRepository, DomainError, DomainResult};
use garde::Validate;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// One wizard-step submission from the route layer.
#[derive(Debug, Clone, Validate)]
pub struct StepSubmissionRequest {
    #[garde(length(min = 1))]
    pub application_id: String,
    #[garde(skip)]
    pub payload: serde_json::Value,
}

/// Result of a step submission: the persisted draft plus the soft failures
/// the normalizer reported. Soft failures are already logged; callers
/// decide whether to also surface them.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSubmission {
    pub draft: ApplicationDraft,
    pub soft_failures: Vec<SoftFailure>,
}

/// Domain service for wizard-step intake.
///
/// Each submit method validates the request, normalizes the step payload,
/// merges the update into the stored draft, and persists it. Each step must
/// be submitted at most once per application: the normalizers consume raw
/// payloads, and re-submitting a step that already ran re-applies its
/// transformation to transformed data.
pub struct IntakeService {
    repository: Arc<dyn ApplicationRepository>,
}

impl IntakeService {
    pub fn new(repository: Arc<dyn ApplicationRepository>) -> Self {
        Self { repository }
    }

    /// Submit the contact step
    #[instrument(skip(self, request), fields(application_id = %request.application_id))]
    pub async fn submit_contact_step(
        &self,
        request: StepSubmissionRequest,
    ) -> DomainResult<StepSubmission> {
        common::garde::validate(&request)?;
        let payload: ContactStepPayload = parse_payload(request.payload)?;
        self.merge_step(&request.application_id, normalize_contact_step(payload), |draft, update| {
            update.apply_to(draft)
        })
        .await
    }

    /// Submit the owner step
    #[instrument(skip(self, request), fields(application_id = %request.application_id))]
    pub async fn submit_owner_step(
        &self,
        request: StepSubmissionRequest,
    ) -> DomainResult<StepSubmission> {
        common::garde::validate(&request)?;
        let payload: OwnerStepPayload = parse_payload(request.payload)?;
        self.merge_step(&request.application_id, normalize_owner_step(payload), |draft, update| {
            update.apply_to(draft)
        })
        .await
    }

    /// Submit the claim step
    #[instrument(skip(self, request), fields(application_id = %request.application_id))]
    pub async fn submit_claim_step(
        &self,
        request: StepSubmissionRequest,
    ) -> DomainResult<StepSubmission> {
        common::garde::validate(&request)?;
        let payload: ClaimStepPayload = parse_payload(request.payload)?;
        self.merge_step(&request.application_id, normalize_claim_step(payload), |draft, update| {
            update.apply_to(draft)
        })
        .await
    }

    /// Submit the bind-request step
    #[instrument(skip(self, request), fields(application_id = %request.application_id))]
    pub async fn submit_bind_request_step(
        &self,
        request: StepSubmissionRequest,
    ) -> DomainResult<StepSubmission> {
        common::garde::validate(&request)?;
        let payload: BindRequestStepPayload = parse_payload(request.payload)?;
        self.merge_step(
            &request.application_id,
            normalize_bind_request_step(payload),
            |draft, update| update.apply_to(draft),
        )
        .await
    }

    /// Load the draft, apply one normalized step update, persist the result.
    ///
    /// The draft is only ever written fully transformed: the normalizer has
    /// already run, so no caller can observe a partially transformed step.
    async fn merge_step<T>(
        &self,
        application_id: &str,
        outcome: StepOutcome<T>,
        apply: impl FnOnce(&mut ApplicationDraft, T),
    ) -> DomainResult<StepSubmission> {
        for failure in &outcome.soft_failures {
            warn!(
                application_id = %application_id,
                field = failure.field,
                reason = %failure.reason,
                "step normalization continued past malformed field"
            );
        }

        let mut draft = self
            .repository
            .get_draft(application_id)
            .await?
            .unwrap_or_default();

        apply(&mut draft, outcome.update);

        self.repository.upsert_draft(application_id, &draft).await?;

        debug!(application_id = %application_id, "step merged into application draft");

        Ok(StepSubmission {
            draft,
            soft_failures: outcome.soft_failures,
        })
    }
}

fn parse_payload<T: DeserializeOwned>(payload: serde_json::Value) -> DomainResult<T> {
    serde_json::from_value(payload).map_err(|e| DomainError::MalformedStepPayload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::MockApplicationRepository;
    use serde_json::json;

    fn request(payload: serde_json::Value) -> StepSubmissionRequest {
        StepSubmissionRequest {
            application_id: "app-123".to_string(),
            payload,
        }
    }

    #[tokio::test]
    async fn test_contact_step_merges_and_persists() {
        // Arrange
        let mut mock_repository = MockApplicationRepository::new();

        mock_repository
            .expect_get_draft()
            .withf(|id: &str| id == "app-123")
            .times(1)
            .return_once(|_| Ok(None));

        mock_repository
            .expect_upsert_draft()
            .withf(|id: &str, draft: &ApplicationDraft| {
                id == "app-123"
                    && draft.agency == Some(1)
                    && draft.experience_modifier == Some(1.00)
                    && draft.business_info.contacts.len() == 1
            })
            .times(1)
            .return_once(|_, _| Ok(()));

        let service = IntakeService::new(Arc::new(mock_repository));

        // Act
        let submission = service
            .submit_contact_step(request(json!({
                "name": "Smith Plumbing LLC",
                "fname": "Pat",
                "lname": "Smith",
                "email": "pat@smithplumbing.example",
                "phone": "7755550123",
            })))
            .await
            .unwrap();

        // Assert
        assert!(submission.soft_failures.is_empty());
        assert_eq!(submission.draft.agency, Some(1));
    }

    #[tokio::test]
    async fn test_owner_step_builds_on_existing_draft() {
        // Arrange
        let mut mock_repository = MockApplicationRepository::new();

        let existing = ApplicationDraft {
            agency: Some(27),
            ..Default::default()
        };
        mock_repository
            .expect_get_draft()
            .times(1)
            .return_once(move |_| Ok(Some(existing)));

        mock_repository
            .expect_upsert_draft()
            .withf(|_, draft: &ApplicationDraft| {
                draft.agency == Some(27)
                    && draft.business_info.owners_json == Some(json!([{"name": "Jane"}]))
            })
            .times(1)
            .return_once(|_, _| Ok(()));

        let service = IntakeService::new(Arc::new(mock_repository));

        // Act
        let submission = service
            .submit_owner_step(request(json!({
                "owners_covered": 0,
                "owners": "[{\"name\":\"Jane\"}]",
            })))
            .await
            .unwrap();

        // Assert
        assert!(submission.soft_failures.is_empty());
    }

    #[tokio::test]
    async fn test_soft_failures_are_returned_and_step_still_succeeds() {
        // Arrange
        let mut mock_repository = MockApplicationRepository::new();
        mock_repository
            .expect_get_draft()
            .times(1)
            .return_once(|_| Ok(None));
        mock_repository
            .expect_upsert_draft()
            .times(1)
            .return_once(|_, _| Ok(()));

        let service = IntakeService::new(Arc::new(mock_repository));

        // Act
        let submission = service
            .submit_claim_step(request(json!({ "claims": "[{broken" })))
            .await
            .unwrap();

        // Assert
        assert_eq!(submission.soft_failures.len(), 1);
        assert_eq!(submission.soft_failures[0].field, "claims");
        assert!(submission.draft.claims.is_empty());
    }

    #[tokio::test]
    async fn test_empty_application_id_is_a_validation_error() {
        let service = IntakeService::new(Arc::new(MockApplicationRepository::new()));

        let result = service
            .submit_contact_step(StepSubmissionRequest {
                application_id: "".to_string(),
                payload: json!({}),
            })
            .await;

        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_impossible_payload_shape_is_malformed() {
        let service = IntakeService::new(Arc::new(MockApplicationRepository::new()));

        // fname must be a string if present
        let result = service
            .submit_contact_step(request(json!({ "fname": {"nested": true} })))
            .await;

        assert!(matches!(result, Err(DomainError::MalformedStepPayload(_))));
    }

    #[tokio::test]
    async fn test_repository_errors_propagate() {
        let mut mock_repository = MockApplicationRepository::new();
        mock_repository
            .expect_get_draft()
            .times(1)
            .return_once(|_| Err(DomainError::RepositoryError(anyhow::anyhow!("pool exhausted"))));

        let service = IntakeService::new(Arc::new(mock_repository));

        let result = service
            .submit_bind_request_step(request(json!({ "additionalInsured": "true" })))
            .await;

        assert!(matches!(result, Err(DomainError::RepositoryError(_))));
    }
}
