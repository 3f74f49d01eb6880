use std::path::Path;
use std::process::ExitCode;

use colored::Colorize;
use crm_forms::ValidationOutcome;

use super::{read_form, read_payload};
use crate::output::OutputFormat;

pub fn handle(form: &Path, data: &Path, format: OutputFormat) -> crm_forms::Result<ExitCode> {
    let schema = read_form(form)?.schema();
    let payload = read_payload(data)?;

    match schema.validate(&payload) {
        ValidationOutcome::Accepted(cleaned) => {
            match format {
                OutputFormat::Json => format.print(&serde_json::json!({ "accepted": true, "data": cleaned })),
                OutputFormat::Table => println!("{}", "Accepted".green().bold()),
            }
            Ok(ExitCode::SUCCESS)
        }
        ValidationOutcome::Rejected(errors) => {
            format.errors(&errors);
            Ok(ExitCode::FAILURE)
        }
    }
}
