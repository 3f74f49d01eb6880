//! Form Aggregate
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::aggregates::submission::Submission;
use crate::domain::events::{DomainEvent, FormEvent};
use crate::domain::schema::ValidationSchema;
use crate::domain::value_objects::{FieldDescriptor, FormId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormStatus {
    #[default]
    Draft,
    Published,
    Closed,
    Archived,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    /// Maximum number of accepted submissions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_limit: Option<u64>,
}

fn published() -> FormStatus {
    FormStatus::Published
}

/// Snapshot of a form as handed to a rendering session.
///
/// `fields` stays untyped: it is authoring data and may contain defects
/// that only the schema synthesizer is allowed to judge.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDefinition {
    #[serde(default)]
    pub id: FormId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "published")]
    pub status: FormStatus,
    #[serde(default)]
    pub fields: Vec<Value>,
    #[serde(default)]
    pub settings: FormSettings,
}

impl FormDefinition {
    pub fn accepts_responses(&self) -> bool {
        self.status == FormStatus::Published
    }

    pub fn schema(&self) -> ValidationSchema {
        ValidationSchema::synthesize(&self.fields)
    }
}

#[derive(Clone, Debug)]
pub struct Form {
    id: FormId, name: String, description: Option<String>, status: FormStatus,
    fields: Vec<Value>, settings: FormSettings, submission_count: u64,
    created_at: DateTime<Utc>, updated_at: DateTime<Utc>, published_at: Option<DateTime<Utc>>,
    events: Vec<DomainEvent>,
}

impl Form {
    pub fn create(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: FormId::new(), name: name.into(), description: None, status: FormStatus::Draft,
            fields: vec![], settings: FormSettings::default(), submission_count: 0,
            created_at: now, updated_at: now, published_at: None, events: vec![],
        }
    }

    /// Rebuild an aggregate from an imported definition
    pub fn from_definition(definition: FormDefinition) -> Self {
        let now = Utc::now();
        let published_at = (definition.status == FormStatus::Published).then_some(now);
        Self {
            id: definition.id, name: definition.name, description: definition.description,
            status: definition.status, fields: definition.fields, settings: definition.settings,
            submission_count: 0, created_at: now, updated_at: now, published_at, events: vec![],
        }
    }

    pub fn id(&self) -> &FormId { &self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn description(&self) -> Option<&str> { self.description.as_deref() }
    pub fn status(&self) -> FormStatus { self.status }
    pub fn fields(&self) -> &[Value] { &self.fields }
    pub fn settings(&self) -> &FormSettings { &self.settings }
    pub fn submission_count(&self) -> u64 { self.submission_count }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn published_at(&self) -> Option<DateTime<Utc>> { self.published_at }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
        self.touch();
    }

    pub fn set_settings(&mut self, settings: FormSettings) {
        self.settings = settings;
        self.touch();
    }

    pub fn add_field(&mut self, field: FieldDescriptor) -> Result<(), FormError> {
        if self.has_field(&field.id) {
            return Err(FormError::DuplicateField(field.id));
        }
        let raw = serde_json::to_value(&field).map_err(|e| FormError::InvalidField(e.to_string()))?;
        self.fields.push(raw);
        self.touch();
        Ok(())
    }

    /// Append a definition exactly as authored, defects included
    pub fn add_raw_field(&mut self, raw: Value) {
        self.fields.push(raw);
        self.touch();
    }

    pub fn remove_field(&mut self, field_id: &str) {
        self.fields.retain(|f| f.get("id").and_then(Value::as_str) != Some(field_id));
        self.touch();
    }

    pub fn publish(&mut self) -> Result<(), FormError> {
        if self.status == FormStatus::Archived {
            return Err(FormError::Archived);
        }
        if self.schema().is_empty() {
            return Err(FormError::NoFields);
        }
        let now = Utc::now();
        self.status = FormStatus::Published;
        self.published_at = Some(now);
        self.touch();
        self.raise_event(DomainEvent::Form(FormEvent::Published { form_id: self.id.clone(), published_at: now }));
        Ok(())
    }

    pub fn close(&mut self) {
        self.status = FormStatus::Closed;
        self.touch();
        self.raise_event(DomainEvent::Form(FormEvent::Closed { form_id: self.id.clone() }));
    }

    pub fn archive(&mut self) { self.status = FormStatus::Archived; self.touch(); }

    pub fn accepts_responses(&self) -> bool {
        self.status == FormStatus::Published
    }

    pub fn response_limit_reached(&self) -> bool {
        self.settings.response_limit.is_some_and(|limit| self.submission_count >= limit)
    }

    /// Bring the cached counter up to the number of stored submissions
    pub fn restore_submission_count(&mut self, stored: u64) {
        self.submission_count = self.submission_count.max(stored);
    }

    /// Count an accepted submission against this form
    pub fn record_submission(&mut self, submission: &Submission) -> Result<(), FormError> {
        if !self.accepts_responses() {
            return Err(FormError::NotAcceptingResponses);
        }
        if self.response_limit_reached() {
            return Err(FormError::ResponseLimitReached);
        }
        self.submission_count += 1;
        self.raise_event(DomainEvent::Form(FormEvent::Submitted {
            form_id: self.id.clone(),
            submission_id: submission.id().clone(),
            submitted_at: submission.submitted_at(),
        }));
        Ok(())
    }

    pub fn schema(&self) -> ValidationSchema {
        ValidationSchema::synthesize(&self.fields)
    }

    pub fn definition(&self) -> FormDefinition {
        FormDefinition {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            status: self.status,
            fields: self.fields.clone(),
            settings: self.settings.clone(),
        }
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn has_field(&self, field_id: &str) -> bool {
        self.fields.iter().any(|f| f.get("id").and_then(Value::as_str) == Some(field_id))
    }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("form has no valid fields")]
    NoFields,
    #[error("form is not accepting responses")]
    NotAcceptingResponses,
    #[error("response limit reached")]
    ResponseLimitReached,
    #[error("field '{0}' already exists")]
    DuplicateField(String),
    #[error("invalid field: {0}")]
    InvalidField(String),
    #[error("archived forms cannot be published")]
    Archived,
}
