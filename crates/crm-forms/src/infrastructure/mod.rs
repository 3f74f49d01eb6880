//! Infrastructure layer
//!
//! Concrete implementations of the outbound ports.

pub mod http;
pub mod persistence;

pub use http::ApiGateway;
pub use persistence::{
    InMemoryEventPublisher, InMemoryFormRepository, InMemorySubmissionRepository, TracingEventPublisher,
};
