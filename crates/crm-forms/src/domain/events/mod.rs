//! Form events
use chrono::{DateTime, Utc};

use crate::domain::value_objects::{FormId, SubmissionId};

#[derive(Clone, Debug)]
pub enum DomainEvent { Form(FormEvent) }

#[derive(Clone, Debug)]
pub enum FormEvent {
    Published { form_id: FormId, published_at: DateTime<Utc> },
    Submitted { form_id: FormId, submission_id: SubmissionId, submitted_at: DateTime<Utc> },
    Closed { form_id: FormId },
}

impl DomainEvent {
    pub fn aggregate_id(&self) -> &FormId {
        match self {
            DomainEvent::Form(e) => match e {
                FormEvent::Published { form_id, .. } => form_id,
                FormEvent::Submitted { form_id, .. } => form_id,
                FormEvent::Closed { form_id } => form_id,
            },
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::Form(e) => match e {
                FormEvent::Published { .. } => "form.published",
                FormEvent::Submitted { .. } => "form.submitted",
                FormEvent::Closed { .. } => "form.closed",
            },
        }
    }
}
