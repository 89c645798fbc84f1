use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Application not found: {0}")]
    ApplicationNotFound(String),

    #[error("Invalid application ID: {0}")]
    InvalidApplicationId(String),

    #[error("Malformed step payload: {0}")]
    MalformedStepPayload(String),

    #[error("Unknown receipt handle: {0}")]
    UnknownReceiptHandle(String),

    #[error("Queue error: {0}")]
    QueueError(#[source] anyhow::Error),

    #[error("Repository error: {0}")]
    RepositoryError(#[from] anyhow::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
