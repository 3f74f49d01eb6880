//! Command implementations

pub mod controls;
pub mod fill;
pub mod remote;
pub mod validate;

use std::path::Path;
use std::process::ExitCode;

use colored::Colorize;
use crm_forms::{FieldValue, FormDefinition, FormSession, FormsError, Payload, SessionError, SubmitOutcome};
use tracing::warn;

use crate::output::OutputFormat;

pub fn read_form(path: &Path) -> crm_forms::Result<FormDefinition> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn read_payload(path: &Path) -> crm_forms::Result<Payload> {
    let content = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    FieldValue::payload_from_json(&value)
        .ok_or_else(|| FormsError::InvalidPayload(format!("{} is not a JSON object", path.display())))
}

/// Copy `payload` into a loaded session and submit it.
///
/// Keys the form does not define are skipped with a warning.
pub async fn fill_and_submit(
    session: &mut FormSession,
    payload: Payload,
    format: OutputFormat,
) -> crm_forms::Result<ExitCode> {
    for (field_id, value) in payload {
        match session.set_value(&field_id, value) {
            Ok(()) => {}
            Err(SessionError::UnknownField(id)) => warn!(field_id = %id, "ignoring value for unknown field"),
            Err(e) => return Err(e.into()),
        }
    }

    match session.submit().await? {
        SubmitOutcome::Submitted(receipt) => {
            format.receipt(&receipt);
            Ok(ExitCode::SUCCESS)
        }
        SubmitOutcome::Invalid(errors) => {
            format.errors(&errors);
            Ok(ExitCode::FAILURE)
        }
        SubmitOutcome::Failed(banner) => {
            eprintln!("{} {}", "Submission failed:".red().bold(), banner);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Report a session that could not load its form.
pub fn report_load_error(session: &FormSession) -> ExitCode {
    let message = session.load_error().unwrap_or("form could not be loaded");
    eprintln!("{} {}", "Error:".red().bold(), message);
    ExitCode::FAILURE
}
