//! Aggregates module

pub mod form;
pub mod submission;

pub use form::{Form, FormDefinition, FormError, FormSettings, FormStatus};
pub use submission::{Submission, SubmissionMetadata};
