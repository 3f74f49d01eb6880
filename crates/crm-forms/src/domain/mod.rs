//! Domain module
//!
//! Field descriptors, the schema synthesizer and the form/submission
//! aggregates.

pub mod aggregates;
pub mod value_objects;
pub mod events;
pub mod schema;

pub use aggregates::*;
pub use value_objects::*;
pub use events::*;
pub use schema::{FieldError, FieldRule, ValidationOutcome, ValidationSchema};
