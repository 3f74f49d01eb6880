//! Outbound ports
//!
//! Hexagonal architecture: interfaces the rendering session and the
//! submission service consume. Infrastructure provides the implementations.

use async_trait::async_trait;
use thiserror::Error;

use crate::application::dto::{SubmissionReceipt, SubmissionRequest};
use crate::domain::aggregates::{Form, FormDefinition, Submission};
use crate::domain::value_objects::FormId;
use crate::domain::DomainEvent;

/// Source of form definitions for rendering sessions
#[async_trait]
pub trait FormSource: Send + Sync {
    /// Fetch the definition of one form
    async fn fetch_form(&self, form_id: &FormId) -> Result<FormDefinition, SourceError>;
}

/// Destination of validated submissions
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    /// Persist one submission
    async fn submit(&self, request: SubmissionRequest) -> Result<SubmissionReceipt, SinkError>;
}

/// Form repository port
#[async_trait]
pub trait FormRepository: Send + Sync {
    /// Find form by ID
    async fn find_by_id(&self, id: &FormId) -> Result<Option<Form>, RepositoryError>;

    /// Save form (insert or update)
    async fn save(&self, form: &Form) -> Result<(), RepositoryError>;

    /// All forms, ordered by id
    async fn list(&self) -> Result<Vec<Form>, RepositoryError>;
}

/// Submission repository port. Append-only.
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Store a new submission; an existing id is a `DuplicateKey`
    async fn append(&self, submission: &Submission) -> Result<(), RepositoryError>;

    /// Submissions of one form, oldest first
    async fn find_by_form(&self, form_id: &FormId) -> Result<Vec<Submission>, RepositoryError>;

    /// Count submissions of one form
    async fn count_by_form(&self, form_id: &FormId) -> Result<u64, RepositoryError>;
}

/// Event publisher port
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish domain events
    async fn publish(&self, events: Vec<DomainEvent>) -> Result<(), RepositoryError>;
}

/// Failure fetching a form definition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("form '{0}' not found")]
    NotFound(FormId),
    #[error("{0}")]
    Transport(String),
}

/// Failure persisting a submission. The display text is shown to the
/// person filling the form as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("{0}")]
    Rejected(String),
    #[error("This form is no longer accepting responses")]
    FormClosed,
    #[error("This form has reached its response limit")]
    ResponseLimitReached,
    #[error("Too many submissions, please try again shortly")]
    RateLimited,
    #[error("Form not found")]
    NotFound,
    #[error("Submission was cancelled")]
    Cancelled,
    #[error("{0}")]
    Transport(String),
}

/// Repository error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Entity not found")]
    NotFound,
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
    #[error("Connection error: {0}")]
    ConnectionError(String),
    #[error("Query error: {0}")]
    QueryError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}
