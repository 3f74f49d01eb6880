//! OpenSASE CRM Forms
//!
//! Dynamic web-form engine of the self-hosted CRM: user-authored forms
//! are turned into validation schemas at runtime, filled through a
//! submission session and persisted schema-less.
//!
//! ## Architecture
//!
//! - **Domain Layer**: field descriptors, schema synthesizer, form and
//!   submission aggregates, domain events
//! - **Application Layer**: rendering sessions, submission intake, DTOs
//! - **Ports Layer**: hexagonal interfaces (form source, submission sink,
//!   repositories)
//! - **Infrastructure Layer**: in-memory stores and the REST gateway
//!
//! ## Flow
//!
//! form definition → [`ValidationSchema`] → [`FormSession`] (default
//! values, controls) → validate on submit → [`SubmissionSink`] →
//! append-only [`Submission`].

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ports;

// Re-exports for convenience
pub use application::{
    FormSession, SessionError, SessionState, SubmissionService, SubmitAttempt, SubmitOutcome,
};
pub use application::dto::{ControlKind, ControlView, SubmissionReceipt, SubmissionRequest};
pub use config::{ConfigError, FormsConfig};
pub use domain::aggregates::{Form, FormDefinition, FormSettings, FormStatus, Submission, SubmissionMetadata};
pub use domain::schema::{FieldError, FieldRule, ValidationOutcome, ValidationSchema};
pub use domain::value_objects::{
    DescriptorDefect, FieldDescriptor, FieldOption, FieldType, FieldValue, FormId, Payload, SubmissionId,
};
pub use error::{FormsError, Result};
pub use ports::inbound::{SubmissionUseCases, UseCaseError};
pub use ports::outbound::{FormSource, SinkError, SourceError, SubmissionSink};
