//! Application layer
//!
//! Orchestrates use cases and coordinates domain objects.

pub mod commands;
pub mod dto;
pub mod rate_limit;
pub mod session;

pub use commands::SubmissionService;
pub use dto::*;
pub use rate_limit::{RateLimitConfig, SubmissionRateLimiter};
pub use session::{FormSession, SessionError, SessionState, SubmitAttempt, SubmitOutcome};
