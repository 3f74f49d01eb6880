//! Inbound ports (Use case traits)
//!
//! Hexagonal architecture: application service interfaces.

use async_trait::async_trait;
use thiserror::Error;

use crate::application::dto::{SubmissionReceipt, SubmissionRequest};
use crate::domain::aggregates::Submission;
use crate::domain::schema::FieldError;
use crate::domain::value_objects::FormId;

/// Server-side submission intake
#[async_trait]
pub trait SubmissionUseCases: Send + Sync {
    /// Re-validate and persist one submission
    async fn submit_response(&self, request: SubmissionRequest) -> Result<SubmissionReceipt, UseCaseError>;

    /// Submissions recorded for a form
    async fn list_submissions(&self, form_id: &FormId) -> Result<Vec<Submission>, UseCaseError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UseCaseError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("form is not accepting responses")]
    FormClosed,
    #[error("response limit reached")]
    ResponseLimitReached,
    #[error("rate limited")]
    RateLimited,
    #[error("{}", join_messages(.0))]
    ValidationError(Vec<FieldError>),
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field_id, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}
