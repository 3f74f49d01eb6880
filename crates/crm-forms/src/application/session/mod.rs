//! Submission Renderer/Validator
//!
//! A [`FormSession`] drives one person filling one form:
//!
//! ```text
//! Loading ──fetch ok──▶ Ready ──submit, valid──▶ Submitting ──sink ok──▶ Submitted
//!    │                  ▲  │                        │                      │
//!    │ fetch failed     │  └─submit, invalid─┐      │ sink failed /        │ submit another
//!    ▼                  │                    │      │ cancelled            │
//!  Error                └────────────────────┴──────┴──────────────────────┘
//! ```
//!
//! Each session owns its values and schema exclusively; nothing is shared
//! between sessions.

pub mod controls;
pub mod handle;

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::application::dto::{ControlView, SubmissionReceipt, SubmissionRequest};
use crate::domain::aggregates::{FormDefinition, FormError, SubmissionMetadata};
use crate::domain::schema::{FieldError, ValidationOutcome, ValidationSchema};
use crate::domain::value_objects::{FieldValue, FormId, Payload};
use crate::ports::outbound::{FormSource, SubmissionSink};

pub use handle::SubmissionHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Loading,
    Ready,
    Submitting,
    Submitted,
    /// Terminal: the form could not be loaded
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("expected session to be {expected:?}, but it is {actual:?}")]
    InvalidState { expected: SessionState, actual: SessionState },
    #[error("form has no field '{0}'")]
    UnknownField(String),
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error("submitting requires a tokio runtime")]
    NoRuntime,
}

/// Result of starting a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitAttempt {
    /// Validation failed; errors are shown inline and nothing was sent
    Invalid(Vec<FieldError>),
    /// The request is on its way to the sink
    InFlight,
}

/// Result of a complete submit
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Invalid(Vec<FieldError>),
    Submitted(SubmissionReceipt),
    /// The sink refused or could not be reached; carries the banner text
    Failed(String),
}

pub struct FormSession {
    form_id: FormId,
    sink: Arc<dyn SubmissionSink>,
    state: SessionState,
    definition: Option<FormDefinition>,
    schema: ValidationSchema,
    values: Payload,
    errors: Vec<FieldError>,
    banner: Option<String>,
    load_error: Option<String>,
    receipt: Option<SubmissionReceipt>,
    metadata: SubmissionMetadata,
    in_flight: Option<SubmissionHandle>,
}

impl FormSession {
    pub fn new(form_id: FormId, sink: Arc<dyn SubmissionSink>) -> Self {
        Self {
            form_id,
            sink,
            state: SessionState::Loading,
            definition: None,
            schema: ValidationSchema::default(),
            values: Payload::new(),
            errors: vec![],
            banner: None,
            load_error: None,
            receipt: None,
            metadata: SubmissionMetadata::default(),
            in_flight: None,
        }
    }

    /// Attach request metadata sent with every submission of this session
    pub fn with_metadata(mut self, metadata: SubmissionMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn form_id(&self) -> &FormId { &self.form_id }
    pub fn state(&self) -> SessionState { self.state }
    pub fn definition(&self) -> Option<&FormDefinition> { self.definition.as_ref() }
    pub fn schema(&self) -> &ValidationSchema { &self.schema }
    pub fn values(&self) -> &Payload { &self.values }
    pub fn value(&self, field_id: &str) -> Option<&FieldValue> { self.values.get(field_id) }
    pub fn errors(&self) -> &[FieldError] { &self.errors }
    pub fn banner(&self) -> Option<&str> { self.banner.as_deref() }
    pub fn load_error(&self) -> Option<&str> { self.load_error.as_deref() }
    pub fn receipt(&self) -> Option<&SubmissionReceipt> { self.receipt.as_ref() }

    pub fn error_for(&self, field_id: &str) -> Option<&str> {
        self.errors.iter().find(|e| e.field_id == field_id).map(|e| e.message.as_str())
    }

    /// Submit is only offered while Ready; this gates double submission
    pub fn can_submit(&self) -> bool {
        self.state == SessionState::Ready
    }

    pub fn controls(&self) -> Vec<ControlView> {
        controls::render(&self.schema, &self.values, &self.errors)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Fetch the form definition and move to Ready, or to the terminal Error state
    pub async fn load(&mut self, source: &dyn FormSource) -> Result<SessionState, SessionError> {
        self.expect_state(SessionState::Loading)?;

        match source.fetch_form(&self.form_id).await {
            Ok(definition) if definition.accepts_responses() => {
                self.schema = definition.schema();
                self.values = self.schema.default_values();
                debug!(form_id = %self.form_id, fields = self.schema.len(), "form loaded");
                self.definition = Some(definition);
                self.transition(SessionState::Ready);
            }
            Ok(definition) => {
                debug!(form_id = %self.form_id, status = ?definition.status, "form is not live");
                self.fail_load(FormError::NotAcceptingResponses.to_string());
            }
            Err(e) => self.fail_load(e.to_string()),
        }
        Ok(self.state)
    }

    /// Edit one field. Clears the inline error of that field.
    pub fn set_value(&mut self, field_id: &str, value: impl Into<FieldValue>) -> Result<(), SessionError> {
        self.expect_state(SessionState::Ready)?;
        if !self.schema.contains(field_id) {
            return Err(SessionError::UnknownField(field_id.to_string()));
        }
        self.values.insert(field_id.to_string(), value.into());
        self.errors.retain(|e| e.field_id != field_id);
        Ok(())
    }

    /// Validate and, if valid, hand the values to the sink without waiting.
    ///
    /// The request runs on the current tokio runtime; outside of one this
    /// returns [`SessionError::NoRuntime`] and the session stays Ready.
    pub fn start_submit(&mut self) -> Result<SubmitAttempt, SessionError> {
        if self.state == SessionState::Submitting {
            return Err(SessionError::SubmissionInFlight);
        }
        self.expect_state(SessionState::Ready)?;
        self.banner = None;

        match self.schema.validate(&self.values) {
            ValidationOutcome::Rejected(errors) => {
                debug!(form_id = %self.form_id, errors = errors.len(), "submission blocked by validation");
                self.errors = errors.clone();
                Ok(SubmitAttempt::Invalid(errors))
            }
            ValidationOutcome::Accepted(data) => {
                let runtime = Handle::try_current().map_err(|_| SessionError::NoRuntime)?;
                self.errors.clear();
                let request = SubmissionRequest {
                    form_id: self.form_id.clone(),
                    data,
                    metadata: self.metadata.clone(),
                };
                self.in_flight = Some(SubmissionHandle::spawn(&runtime, Arc::clone(&self.sink), request));
                self.transition(SessionState::Submitting);
                Ok(SubmitAttempt::InFlight)
            }
        }
    }

    /// Wait for the in-flight submission to settle
    pub async fn finish_submit(&mut self) -> Result<SubmitOutcome, SessionError> {
        self.expect_state(SessionState::Submitting)?;
        let result = match self.in_flight.as_mut() {
            Some(handle) => handle.outcome().await,
            None => {
                self.transition(SessionState::Ready);
                return Err(SessionError::InvalidState {
                    expected: SessionState::Submitting,
                    actual: SessionState::Ready,
                });
            }
        };
        self.in_flight = None;

        match result {
            Ok(receipt) => {
                info!(form_id = %self.form_id, submission_id = %receipt.submission_id, "submission accepted");
                self.receipt = Some(receipt.clone());
                self.transition(SessionState::Submitted);
                Ok(SubmitOutcome::Submitted(receipt))
            }
            Err(e) => {
                let message = e.to_string();
                warn!(form_id = %self.form_id, error = %message, "submission failed");
                self.banner = Some(message.clone());
                self.transition(SessionState::Ready);
                Ok(SubmitOutcome::Failed(message))
            }
        }
    }

    /// Validate, send and wait
    pub async fn submit(&mut self) -> Result<SubmitOutcome, SessionError> {
        match self.start_submit()? {
            SubmitAttempt::Invalid(errors) => Ok(SubmitOutcome::Invalid(errors)),
            SubmitAttempt::InFlight => self.finish_submit().await,
        }
    }

    /// Abort the in-flight request and return to Ready with values intact.
    ///
    /// Returns `false` when the request had already settled; the session is
    /// left in Submitting so [`FormSession::finish_submit`] can pick up the answer.
    pub fn cancel_submit(&mut self) -> Result<bool, SessionError> {
        self.expect_state(SessionState::Submitting)?;
        if self.in_flight.as_ref().is_some_and(SubmissionHandle::is_finished) {
            return Ok(false);
        }
        if let Some(handle) = self.in_flight.take() {
            handle.cancel();
        }
        self.transition(SessionState::Ready);
        Ok(true)
    }

    /// Start a fresh response after a successful one
    pub fn submit_another(&mut self) -> Result<(), SessionError> {
        self.expect_state(SessionState::Submitted)?;
        self.values = self.schema.default_values();
        self.errors.clear();
        self.banner = None;
        self.receipt = None;
        self.transition(SessionState::Ready);
        Ok(())
    }

    fn fail_load(&mut self, message: String) {
        warn!(form_id = %self.form_id, error = %message, "form could not be loaded");
        self.load_error = Some(message);
        self.transition(SessionState::Error);
    }

    fn expect_state(&self, expected: SessionState) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidState { expected, actual: self.state })
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug!(form_id = %self.form_id, from = ?self.state, to = ?next, "session transition");
        self.state = next;
    }
}

impl Drop for FormSession {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            debug!(form_id = %self.form_id, "session torn down with a submission in flight");
            handle.cancel();
        }
    }
}

impl std::fmt::Debug for FormSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormSession")
            .field("form_id", &self.form_id)
            .field("state", &self.state)
            .field("values", &self.values)
            .field("errors", &self.errors)
            .field("banner", &self.banner)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dto::SubmissionReceipt;
    use crate::domain::aggregates::{Form, FormDefinition, FormStatus};
    use crate::domain::value_objects::{FieldDescriptor, FieldType, SubmissionId};
    use crate::infrastructure::persistence::InMemoryFormRepository;
    use crate::ports::outbound::{FormRepository, SinkError, SourceError};
    use async_trait::async_trait;
    use chrono::Utc;
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Default)]
    struct RecordingSink {
        requests: Mutex<Vec<SubmissionRequest>>,
    }

    #[async_trait]
    impl SubmissionSink for RecordingSink {
        async fn submit(&self, request: SubmissionRequest) -> Result<SubmissionReceipt, SinkError> {
            let receipt = SubmissionReceipt {
                submission_id: SubmissionId::new(),
                form_id: request.form_id.clone(),
                submitted_at: Utc::now(),
                confirmation_message: Some("Thanks!".into()),
                redirect_url: None,
            };
            self.requests.lock().push(request);
            Ok(receipt)
        }
    }

    struct FailingSink(SinkError);

    #[async_trait]
    impl SubmissionSink for FailingSink {
        async fn submit(&self, _request: SubmissionRequest) -> Result<SubmissionReceipt, SinkError> {
            Err(self.0.clone())
        }
    }

    struct PendingSink;

    #[async_trait]
    impl SubmissionSink for PendingSink {
        async fn submit(&self, _request: SubmissionRequest) -> Result<SubmissionReceipt, SinkError> {
            std::future::pending().await
        }
    }

    struct UnreachableSource;

    #[async_trait]
    impl FormSource for UnreachableSource {
        async fn fetch_form(&self, _form_id: &FormId) -> Result<FormDefinition, SourceError> {
            Err(SourceError::Transport("connection refused".into()))
        }
    }

    async fn store_with(fields: Vec<FieldDescriptor>) -> (InMemoryFormRepository, FormId) {
        let repo = InMemoryFormRepository::new();
        let mut form = Form::create("Signup");
        for field in fields {
            form.add_field(field).unwrap();
        }
        form.publish().unwrap();
        repo.save(&form).await.unwrap();
        (repo, form.id().clone())
    }

    async fn ready_session(fields: Vec<FieldDescriptor>, sink: Arc<dyn SubmissionSink>) -> FormSession {
        let (repo, id) = store_with(fields).await;
        let mut session = FormSession::new(id, sink);
        assert_eq!(session.load(&repo).await.unwrap(), SessionState::Ready);
        session
    }

    fn email_field() -> Vec<FieldDescriptor> {
        vec![FieldDescriptor::new("email", FieldType::Email, "Email").required()]
    }

    #[tokio::test]
    async fn test_fields_start_at_zero_values() {
        let session = ready_session(
            vec![
                FieldDescriptor::new("name", FieldType::Text, "Name"),
                FieldDescriptor::new("subscribe", FieldType::Checkbox, "Subscribe"),
            ],
            Arc::new(RecordingSink::default()),
        )
        .await;
        assert_eq!(session.value("name"), Some(&FieldValue::text("")));
        assert_eq!(session.value("subscribe"), Some(&FieldValue::Bool(false)));
        assert_eq!(session.controls().len(), 2);
    }

    #[tokio::test]
    async fn test_email_scenario_reaches_submitted() {
        let sink = Arc::new(RecordingSink::default());
        let mut session = ready_session(email_field(), sink.clone()).await;

        session.set_value("email", "not-an-email").unwrap();
        let outcome = session.submit().await.unwrap();
        assert!(matches!(&outcome, SubmitOutcome::Invalid(errors) if errors.len() == 1));
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.error_for("email"), Some("Please enter a valid email address"));
        assert!(sink.requests.lock().is_empty());

        session.set_value("email", "a@b.com").unwrap();
        assert!(session.errors().is_empty());
        assert_eq!(session.start_submit().unwrap(), SubmitAttempt::InFlight);
        assert_eq!(session.state(), SessionState::Submitting);
        assert!(matches!(session.finish_submit().await.unwrap(), SubmitOutcome::Submitted(_)));
        assert_eq!(session.state(), SessionState::Submitted);

        let requests = sink.requests.lock();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].data["email"], FieldValue::text("a@b.com"));
    }

    #[tokio::test]
    async fn test_required_checkbox_false_submits() {
        let sink = Arc::new(RecordingSink::default());
        let mut session = ready_session(
            vec![FieldDescriptor::new("subscribe", FieldType::Checkbox, "Subscribe").required()],
            sink.clone(),
        )
        .await;
        assert!(matches!(session.submit().await.unwrap(), SubmitOutcome::Submitted(_)));
        assert_eq!(sink.requests.lock()[0].data["subscribe"], FieldValue::Bool(false));
    }

    #[test]
    fn test_start_submit_outside_runtime_stays_ready() {
        let sink = Arc::new(RecordingSink::default());
        let mut session = tokio_test::block_on(ready_session(email_field(), sink.clone()));
        session.set_value("email", "a@b.com").unwrap();

        assert_eq!(session.start_submit(), Err(SessionError::NoRuntime));
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.value("email"), Some(&FieldValue::text("a@b.com")));
        assert!(sink.requests.lock().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_values() {
        let sink = Arc::new(FailingSink(SinkError::Transport("Gateway timeout from upstream".into())));
        let mut session = ready_session(email_field(), sink).await;
        session.set_value("email", "a@b.com").unwrap();

        let outcome = session.submit().await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Failed("Gateway timeout from upstream".into()));
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.banner(), Some("Gateway timeout from upstream"));
        assert_eq!(session.value("email"), Some(&FieldValue::text("a@b.com")));
    }

    #[tokio::test]
    async fn test_submit_another_resets_fields() {
        let mut session = ready_session(
            vec![
                FieldDescriptor::new("email", FieldType::Email, "Email").required(),
                FieldDescriptor::new("agree", FieldType::Checkbox, "Agree"),
            ],
            Arc::new(RecordingSink::default()),
        )
        .await;
        session.set_value("email", "a@b.com").unwrap();
        session.set_value("agree", true).unwrap();
        session.submit().await.unwrap();
        assert!(session.receipt().is_some());

        session.submit_another().unwrap();
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.value("email"), Some(&FieldValue::text("")));
        assert_eq!(session.value("agree"), Some(&FieldValue::Bool(false)));
        assert!(session.receipt().is_none());
    }

    #[tokio::test]
    async fn test_double_submit_is_gated() {
        let mut session = ready_session(email_field(), Arc::new(PendingSink)).await;
        session.set_value("email", "a@b.com").unwrap();
        session.start_submit().unwrap();
        assert!(!session.can_submit());
        assert_eq!(session.start_submit(), Err(SessionError::SubmissionInFlight));
        assert!(matches!(session.set_value("email", "x@y.com"), Err(SessionError::InvalidState { .. })));
    }

    #[tokio::test]
    async fn test_cancel_returns_to_ready() {
        let mut session = ready_session(email_field(), Arc::new(PendingSink)).await;
        session.set_value("email", "a@b.com").unwrap();
        session.start_submit().unwrap();
        tokio::task::yield_now().await;

        assert_eq!(session.cancel_submit(), Ok(true));
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.value("email"), Some(&FieldValue::text("a@b.com")));
    }

    #[tokio::test]
    async fn test_dropping_session_aborts_request() {
        let sink = Arc::new(PendingSink);
        let mut session = ready_session(email_field(), sink.clone()).await;
        session.set_value("email", "a@b.com").unwrap();
        session.start_submit().unwrap();
        tokio::task::yield_now().await;
        assert!(Arc::strong_count(&sink) > 2);

        drop(session);
        for _ in 0..16 {
            if Arc::strong_count(&sink) == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(Arc::strong_count(&sink), 1);
    }

    #[tokio::test]
    async fn test_load_failures_are_terminal() {
        let mut session = FormSession::new(FormId::from_string("missing"), Arc::new(RecordingSink::default()));
        assert_eq!(session.load(&UnreachableSource).await.unwrap(), SessionState::Error);
        assert_eq!(session.load_error(), Some("connection refused"));
        assert!(session.load(&UnreachableSource).await.is_err());
        assert!(session.set_value("email", "a@b.com").is_err());

        let repo = InMemoryFormRepository::new();
        let mut session = FormSession::new(FormId::from_string("missing"), Arc::new(RecordingSink::default()));
        session.load(&repo).await.unwrap();
        assert_eq!(session.state(), SessionState::Error);
        assert_eq!(session.load_error(), Some("form 'missing' not found"));
    }

    #[tokio::test]
    async fn test_closed_form_does_not_render() {
        let repo = InMemoryFormRepository::new();
        let form = Form::from_definition(FormDefinition {
            id: FormId::from_string("old"),
            name: "Old survey".into(),
            description: None,
            status: FormStatus::Closed,
            fields: vec![json!({"id": "q", "type": "text"})],
            settings: Default::default(),
        });
        repo.save(&form).await.unwrap();

        let mut session = FormSession::new(form.id().clone(), Arc::new(RecordingSink::default()));
        assert_eq!(session.load(&repo).await.unwrap(), SessionState::Error);
        assert!(session.controls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_field_edit() {
        let mut session = ready_session(email_field(), Arc::new(RecordingSink::default())).await;
        assert_eq!(session.set_value("phone", "555"), Err(SessionError::UnknownField("phone".into())));
    }
}
