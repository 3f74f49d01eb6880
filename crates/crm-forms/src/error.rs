//! Error types for the forms engine

use thiserror::Error;

use crate::application::session::SessionError;
use crate::config::ConfigError;
use crate::ports::inbound::UseCaseError;
use crate::ports::outbound::{RepositoryError, SinkError, SourceError};

/// Forms error type
#[derive(Error, Debug)]
pub enum FormsError {
    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Form definition could not be fetched
    #[error("form source: {0}")]
    Source(#[from] SourceError),

    /// Submission could not be persisted
    #[error("submission: {0}")]
    Sink(#[from] SinkError),

    /// Session operation in the wrong state
    #[error("session: {0}")]
    Session(#[from] SessionError),

    /// Intake use case failed
    #[error(transparent)]
    UseCase(#[from] UseCaseError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// HTTP client could not be built
    #[error("http client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload document is not a JSON object of field values
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

/// Result type for the forms engine
pub type Result<T> = std::result::Result<T, FormsError>;
