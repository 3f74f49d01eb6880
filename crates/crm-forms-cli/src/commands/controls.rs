use std::path::Path;
use std::process::ExitCode;

use crm_forms::application::session::controls::render;

use super::read_form;
use crate::output::OutputFormat;

pub fn handle(form: &Path, format: OutputFormat) -> crm_forms::Result<ExitCode> {
    let schema = read_form(form)?.schema();
    format.controls(&render(&schema, &schema.default_values(), &[]));
    Ok(ExitCode::SUCCESS)
}
