//! Output formatting

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

use crm_forms::{ControlKind, ControlView, FieldError, FieldValue, SubmissionReceipt};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn print<T: Serialize>(&self, data: &T) {
        println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
    }

    pub fn controls(&self, controls: &[ControlView]) {
        match self {
            OutputFormat::Json => self.print(&controls),
            OutputFormat::Table => {
                println!("{:<20} {:<12} {:<9} {}", "FIELD".bold(), "CONTROL".bold(), "REQUIRED".bold(), "VALUE".bold());
                for control in controls {
                    println!(
                        "{:<20} {:<12} {:<9} {}",
                        control.field_id,
                        control_name(&control.control),
                        if control.required { "yes" } else { "" },
                        display_value(&control.value),
                    );
                    if let Some(error) = &control.error {
                        println!("  {}", error.red());
                    }
                }
            }
        }
    }

    pub fn errors(&self, errors: &[FieldError]) {
        match self {
            OutputFormat::Json => self.print(&serde_json::json!({ "accepted": false, "errors": errors })),
            OutputFormat::Table => {
                println!("{}", "Rejected".red().bold());
                for error in errors {
                    println!("  {:<20} {}", error.field_id, error.message);
                }
            }
        }
    }

    pub fn receipt(&self, receipt: &SubmissionReceipt) {
        match self {
            OutputFormat::Json => self.print(receipt),
            OutputFormat::Table => {
                println!("{} {}", "Submitted".green().bold(), receipt.submission_id);
                if let Some(message) = &receipt.confirmation_message {
                    println!("  {}", message);
                }
            }
        }
    }
}

fn control_name(kind: &ControlKind) -> &'static str {
    match kind {
        ControlKind::TextInput => "text",
        ControlKind::EmailInput => "email",
        ControlKind::NumberInput => "number",
        ControlKind::TextArea => "textarea",
        ControlKind::Select { multiple: true, .. } => "multiselect",
        ControlKind::Select { .. } => "select",
        ControlKind::RadioGroup { .. } => "radio",
        ControlKind::Checkbox => "checkbox",
    }
}

pub fn display_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(s) => format!("{:?}", s),
        FieldValue::Bool(b) => b.to_string(),
        FieldValue::List(items) => format!("[{}]", items.join(", ")),
    }
}
