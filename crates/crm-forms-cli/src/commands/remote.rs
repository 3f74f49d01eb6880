use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use crm_forms::infrastructure::ApiGateway;
use crm_forms::{FormId, FormSession, FormsConfig, SessionState, SubmissionMetadata};

use super::{fill_and_submit, read_payload, report_load_error};
use crate::output::OutputFormat;

fn gateway(config: &FormsConfig) -> crm_forms::Result<Arc<ApiGateway>> {
    let gateway = ApiGateway::new(&config.api_url, config.api_key.as_deref(), config.request_timeout())?;
    Ok(Arc::new(gateway))
}

/// Fetch a form and show the controls it renders to
pub async fn fetch(id: &str, config: &FormsConfig, format: OutputFormat) -> crm_forms::Result<ExitCode> {
    let gateway = gateway(config)?;
    let mut session = FormSession::new(FormId::from_string(id), gateway.clone());
    if session.load(&*gateway).await? == SessionState::Error {
        return Ok(report_load_error(&session));
    }
    format.controls(&session.controls());
    Ok(ExitCode::SUCCESS)
}

/// Fill a remote form with `data` and post it back
pub async fn submit(id: &str, data: &Path, config: &FormsConfig, format: OutputFormat) -> crm_forms::Result<ExitCode> {
    let payload = read_payload(data)?;
    let gateway = gateway(config)?;
    let mut session = FormSession::new(FormId::from_string(id), gateway.clone()).with_metadata(SubmissionMetadata {
        source: Some("cli".into()),
        ..Default::default()
    });
    if session.load(&*gateway).await? == SessionState::Error {
        return Ok(report_load_error(&session));
    }
    fill_and_submit(&mut session, payload, format).await
}
