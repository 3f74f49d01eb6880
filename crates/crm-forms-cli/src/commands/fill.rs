use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use crm_forms::application::SubmissionRateLimiter;
use crm_forms::infrastructure::{InMemoryFormRepository, InMemorySubmissionRepository, TracingEventPublisher};
use crm_forms::ports::outbound::FormRepository;
use crm_forms::{Form, FormSession, FormsConfig, SessionState, SubmissionMetadata, SubmissionService};

use super::{fill_and_submit, read_form, read_payload, report_load_error};
use crate::output::OutputFormat;

/// Run a full session against in-memory storage
pub async fn handle(form: &Path, data: &Path, config: &FormsConfig, format: OutputFormat) -> crm_forms::Result<ExitCode> {
    let form = Form::from_definition(read_form(form)?);
    let payload = read_payload(data)?;
    let form_id = form.id().clone();

    let forms = Arc::new(InMemoryFormRepository::new());
    forms.save(&form).await?;

    let mut service = SubmissionService::new(
        forms.clone(),
        Arc::new(InMemorySubmissionRepository::new()),
        Arc::new(TracingEventPublisher),
    );
    if let Some(limit) = config.rate_limit.clone() {
        service = service.with_rate_limiter(SubmissionRateLimiter::new(limit));
    }

    let mut session = FormSession::new(form_id, Arc::new(service)).with_metadata(SubmissionMetadata {
        source: Some("cli".into()),
        ..Default::default()
    });
    if session.load(&*forms).await? == SessionState::Error {
        return Ok(report_load_error(&session));
    }

    fill_and_submit(&mut session, payload, format).await
}
