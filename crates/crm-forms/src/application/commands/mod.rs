//! Command handlers
//!
//! Application services that orchestrate use cases.

use std::sync::Arc;
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::application::dto::{SubmissionReceipt, SubmissionRequest};
use crate::application::rate_limit::SubmissionRateLimiter;
use crate::domain::aggregates::{FormError, Submission};
use crate::domain::schema::ValidationOutcome;
use crate::domain::value_objects::FormId;
use crate::ports::inbound::{SubmissionUseCases, UseCaseError};
use crate::ports::outbound::{
    EventPublisher, FormRepository, SinkError, SubmissionRepository, SubmissionSink,
};

/// Submission intake service.
///
/// Never trusts the client: the schema is synthesized again from the
/// stored form and the payload re-validated before anything is persisted.
///
/// Intake for one form is serialised: the response limit check and the
/// append happen under the same per-form lock.
pub struct SubmissionService {
    form_repo: Arc<dyn FormRepository>,
    submission_repo: Arc<dyn SubmissionRepository>,
    event_publisher: Arc<dyn EventPublisher>,
    rate_limiter: Option<SubmissionRateLimiter>,
    intake_locks: DashMap<FormId, Arc<Mutex<()>>>,
}

impl SubmissionService {
    pub fn new(
        form_repo: Arc<dyn FormRepository>,
        submission_repo: Arc<dyn SubmissionRepository>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            form_repo,
            submission_repo,
            event_publisher,
            rate_limiter: None,
            intake_locks: DashMap::new(),
        }
    }

    pub fn with_rate_limiter(mut self, limiter: SubmissionRateLimiter) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    fn intake_lock(&self, form_id: &FormId) -> Arc<Mutex<()>> {
        self.intake_locks.entry(form_id.clone()).or_default().clone()
    }
}

#[async_trait]
impl SubmissionUseCases for SubmissionService {
    async fn submit_response(&self, request: SubmissionRequest) -> Result<SubmissionReceipt, UseCaseError> {
        let lock = self.intake_lock(&request.form_id);
        let _guard = lock.lock().await;

        let mut form = self.form_repo.find_by_id(&request.form_id).await
            .map_err(|e| UseCaseError::RepositoryError(e.to_string()))?
            .ok_or_else(|| UseCaseError::NotFound(format!("form '{}'", request.form_id)))?;

        // The submission store is authoritative for the response limit
        let stored = self.submission_repo.count_by_form(form.id()).await
            .map_err(|e| UseCaseError::RepositoryError(e.to_string()))?;
        form.restore_submission_count(stored);

        if !form.accepts_responses() {
            return Err(UseCaseError::FormClosed);
        }
        if form.response_limit_reached() {
            return Err(UseCaseError::ResponseLimitReached);
        }
        if let Some(limiter) = &self.rate_limiter {
            if !limiter.try_acquire(form.id()) {
                debug!(form_id = %form.id(), "submission rate limited");
                return Err(UseCaseError::RateLimited);
            }
        }

        // Validate server-side against the stored definition
        let data = match form.schema().validate(&request.data) {
            ValidationOutcome::Accepted(data) => data,
            ValidationOutcome::Rejected(errors) => return Err(UseCaseError::ValidationError(errors)),
        };

        let submission = Submission::create(form.id().clone(), data, request.metadata);
        form.record_submission(&submission).map_err(|e| match e {
            FormError::ResponseLimitReached => UseCaseError::ResponseLimitReached,
            _ => UseCaseError::FormClosed,
        })?;

        self.submission_repo.append(&submission).await
            .map_err(|e| UseCaseError::RepositoryError(e.to_string()))?;

        // Stored from here on: later failures must not fail the request
        if let Err(e) = self.form_repo.save(&form).await {
            warn!(form_id = %form.id(), submission_id = %submission.id(), error = %e, "failed to update form after submission");
        }
        let events = form.take_events();
        if let Err(e) = self.event_publisher.publish(events).await {
            warn!(form_id = %form.id(), submission_id = %submission.id(), error = %e, "failed to publish submission events");
        }

        info!(form_id = %form.id(), submission_id = %submission.id(), "submission recorded");

        Ok(SubmissionReceipt {
            submission_id: submission.id().clone(),
            form_id: form.id().clone(),
            submitted_at: submission.submitted_at(),
            confirmation_message: form.settings().confirmation_message.clone(),
            redirect_url: form.settings().redirect_url.clone(),
        })
    }

    async fn list_submissions(&self, form_id: &FormId) -> Result<Vec<Submission>, UseCaseError> {
        self.submission_repo.find_by_form(form_id).await
            .map_err(|e| UseCaseError::RepositoryError(e.to_string()))
    }
}

/// Sessions running in the same process talk to the service directly
#[async_trait]
impl SubmissionSink for SubmissionService {
    async fn submit(&self, request: SubmissionRequest) -> Result<SubmissionReceipt, SinkError> {
        self.submit_response(request).await.map_err(SinkError::from)
    }
}

impl From<UseCaseError> for SinkError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(_) => SinkError::NotFound,
            UseCaseError::FormClosed => SinkError::FormClosed,
            UseCaseError::ResponseLimitReached => SinkError::ResponseLimitReached,
            UseCaseError::RateLimited => SinkError::RateLimited,
            e @ UseCaseError::ValidationError(_) => SinkError::Rejected(e.to_string()),
            UseCaseError::RepositoryError(msg) => SinkError::Transport(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::rate_limit::RateLimitConfig;
    use crate::domain::aggregates::{Form, FormSettings, SubmissionMetadata};
    use crate::domain::value_objects::{FieldDescriptor, FieldType, FieldValue, Payload};
    use crate::domain::DomainEvent;
    use crate::infrastructure::persistence::{
        InMemoryEventPublisher, InMemoryFormRepository, InMemorySubmissionRepository,
    };
    use crate::ports::outbound::RepositoryError;
    use tokio_test::{assert_err, assert_ok};

    /// Hands control back to the scheduler between reading and writing a form
    struct YieldingFormRepository(Arc<InMemoryFormRepository>);

    #[async_trait]
    impl FormRepository for YieldingFormRepository {
        async fn find_by_id(&self, id: &FormId) -> Result<Option<Form>, RepositoryError> {
            let form = self.0.find_by_id(id).await;
            tokio::task::yield_now().await;
            form
        }

        async fn save(&self, form: &Form) -> Result<(), RepositoryError> {
            self.0.save(form).await
        }

        async fn list(&self) -> Result<Vec<Form>, RepositoryError> {
            self.0.list().await
        }
    }

    /// Reads work, writes fail
    struct ReadOnlyFormRepository(Arc<InMemoryFormRepository>);

    #[async_trait]
    impl FormRepository for ReadOnlyFormRepository {
        async fn find_by_id(&self, id: &FormId) -> Result<Option<Form>, RepositoryError> {
            self.0.find_by_id(id).await
        }

        async fn save(&self, _form: &Form) -> Result<(), RepositoryError> {
            Err(RepositoryError::ConnectionError("database is read-only".into()))
        }

        async fn list(&self) -> Result<Vec<Form>, RepositoryError> {
            self.0.list().await
        }
    }

    struct BrokerDown;

    #[async_trait]
    impl EventPublisher for BrokerDown {
        async fn publish(&self, _events: Vec<DomainEvent>) -> Result<(), RepositoryError> {
            Err(RepositoryError::ConnectionError("broker down".into()))
        }
    }

    struct Fixture {
        forms: Arc<InMemoryFormRepository>,
        submissions: Arc<InMemorySubmissionRepository>,
        events: Arc<InMemoryEventPublisher>,
        form_id: FormId,
    }

    impl Fixture {
        async fn new(settings: FormSettings) -> Self {
            let forms = Arc::new(InMemoryFormRepository::new());
            let mut form = Form::create("Demo request");
            form.add_field(FieldDescriptor::new("email", FieldType::Email, "Email").required()).unwrap();
            form.add_field(FieldDescriptor::new("seats", FieldType::Number, "Seats")).unwrap();
            form.set_settings(settings);
            form.publish().unwrap();
            form.take_events();
            forms.save(&form).await.unwrap();
            Self {
                forms,
                submissions: Arc::new(InMemorySubmissionRepository::new()),
                events: Arc::new(InMemoryEventPublisher::new()),
                form_id: form.id().clone(),
            }
        }

        fn service(&self) -> SubmissionService {
            SubmissionService::new(self.forms.clone(), self.submissions.clone(), self.events.clone())
        }

        fn request(&self, entries: &[(&str, &str)]) -> SubmissionRequest {
            let data: Payload = entries.iter().map(|(k, v)| (k.to_string(), FieldValue::text(*v))).collect();
            SubmissionRequest {
                form_id: self.form_id.clone(),
                data,
                metadata: SubmissionMetadata { source: Some("test".into()), ..Default::default() },
            }
        }
    }

    #[tokio::test]
    async fn test_submission_is_persisted_and_published() {
        let fx = Fixture::new(FormSettings {
            confirmation_message: Some("We'll be in touch".into()),
            ..Default::default()
        })
        .await;
        let service = fx.service();

        let receipt = assert_ok!(service.submit_response(fx.request(&[("email", "a@b.com"), ("seats", "5")])).await);
        assert_eq!(receipt.confirmation_message.as_deref(), Some("We'll be in touch"));

        let stored = service.list_submissions(&fx.form_id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].data()["seats"], FieldValue::text("5"));
        assert_eq!(stored[0].metadata().source.as_deref(), Some("test"));

        let events = fx.events.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "form.submitted");

        let form = fx.forms.find_by_id(&fx.form_id).await.unwrap().unwrap();
        assert_eq!(form.submission_count(), 1);
    }

    #[tokio::test]
    async fn test_server_side_validation() {
        let fx = Fixture::new(FormSettings::default()).await;
        let err = assert_err!(fx.service().submit_response(fx.request(&[("email", "nope")])).await);
        assert_eq!(err.to_string(), "email: Please enter a valid email address");
        assert_eq!(fx.submissions.count_by_form(&fx.form_id).await.unwrap(), 0);

        let sink_err = SinkError::from(err);
        assert_eq!(sink_err.to_string(), "email: Please enter a valid email address");
    }

    #[tokio::test]
    async fn test_closed_and_missing_forms() {
        let fx = Fixture::new(FormSettings::default()).await;
        let mut form = fx.forms.find_by_id(&fx.form_id).await.unwrap().unwrap();
        form.close();
        fx.forms.save(&form).await.unwrap();

        let service = fx.service();
        assert_eq!(
            service.submit(fx.request(&[("email", "a@b.com")])).await,
            Err(SinkError::FormClosed)
        );

        let mut stray = fx.request(&[("email", "a@b.com")]);
        stray.form_id = FormId::from_string("nope");
        assert_eq!(service.submit(stray).await, Err(SinkError::NotFound));
    }

    #[tokio::test]
    async fn test_response_limit() {
        let fx = Fixture::new(FormSettings { response_limit: Some(1), ..Default::default() }).await;
        let service = fx.service();
        assert_ok!(service.submit_response(fx.request(&[("email", "a@b.com")])).await);
        assert_eq!(
            service.submit_response(fx.request(&[("email", "c@d.com")])).await,
            Err(UseCaseError::ResponseLimitReached)
        );
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let fx = Fixture::new(FormSettings::default()).await;
        let service = fx
            .service()
            .with_rate_limiter(SubmissionRateLimiter::new(RateLimitConfig { per_minute: 1, burst: 1 }));
        assert_ok!(service.submit_response(fx.request(&[("email", "a@b.com")])).await);
        assert_eq!(
            service.submit(fx.request(&[("email", "c@d.com")])).await,
            Err(SinkError::RateLimited)
        );
    }

    #[tokio::test]
    async fn test_response_limit_holds_under_concurrent_submissions() {
        let fx = Fixture::new(FormSettings { response_limit: Some(1), ..Default::default() }).await;
        let service = SubmissionService::new(
            Arc::new(YieldingFormRepository(fx.forms.clone())),
            fx.submissions.clone(),
            fx.events.clone(),
        );

        let (first, second) = tokio::join!(
            service.submit_response(fx.request(&[("email", "a@b.com")])),
            service.submit_response(fx.request(&[("email", "c@d.com")])),
        );
        assert_eq!(first.is_ok() as u8 + second.is_ok() as u8, 1);
        assert!([&first, &second].iter().any(|r| **r == Err(UseCaseError::ResponseLimitReached)));
        assert_eq!(fx.submissions.count_by_form(&fx.form_id).await.unwrap(), 1);

        let form = fx.forms.find_by_id(&fx.form_id).await.unwrap().unwrap();
        assert_eq!(form.submission_count(), 1);
    }

    #[tokio::test]
    async fn test_stored_submission_survives_publish_failure() {
        let fx = Fixture::new(FormSettings::default()).await;
        let service = SubmissionService::new(fx.forms.clone(), fx.submissions.clone(), Arc::new(BrokerDown));

        let receipt = assert_ok!(service.submit(fx.request(&[("email", "a@b.com")])).await);
        let stored = service.list_submissions(&fx.form_id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id(), &receipt.submission_id);
    }

    #[tokio::test]
    async fn test_failed_form_update_still_counts_toward_limit() {
        let fx = Fixture::new(FormSettings { response_limit: Some(1), ..Default::default() }).await;
        let service = SubmissionService::new(
            Arc::new(ReadOnlyFormRepository(fx.forms.clone())),
            fx.submissions.clone(),
            fx.events.clone(),
        );

        assert_ok!(service.submit_response(fx.request(&[("email", "a@b.com")])).await);
        assert_eq!(
            service.submit_response(fx.request(&[("email", "c@d.com")])).await,
            Err(UseCaseError::ResponseLimitReached)
        );
        assert_eq!(fx.submissions.count_by_form(&fx.form_id).await.unwrap(), 1);
    }
}
