//! Schema Synthesizer
//!
//! Turns an ordered list of authored field definitions into a
//! [`ValidationSchema`]. Synthesis never fails: malformed definitions are
//! logged and left out, so one bad field cannot break validation of the
//! rest of the form.

pub mod rules;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::value_objects::{DescriptorDefect, FieldDescriptor, FieldValue, Payload};
pub use rules::{ChoiceRule, FieldRule, NumberRule, TextRule};

/// One synthesized field: the descriptor it came from and its rule
#[derive(Clone, Debug)]
pub struct SchemaField {
    pub descriptor: FieldDescriptor,
    pub rule: FieldRule,
}

/// Field-scoped validation failure
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field_id: String,
    pub message: String,
}

/// Result of validating a candidate payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Values kept per field, restricted to the fields of the schema
    Accepted(Payload),
    /// One error per offending field, in field order
    Rejected(Vec<FieldError>),
}

impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    pub fn errors(&self) -> &[FieldError] {
        match self {
            Self::Accepted(_) => &[],
            Self::Rejected(errors) => errors,
        }
    }

    pub fn into_result(self) -> Result<Payload, Vec<FieldError>> {
        match self {
            Self::Accepted(payload) => Ok(payload),
            Self::Rejected(errors) => Err(errors),
        }
    }
}

/// Ephemeral ruleset derived from a form's field definitions
#[derive(Clone, Debug, Default)]
pub struct ValidationSchema {
    fields: Vec<SchemaField>,
    /// Definitions left out, by index in the authored list
    skipped: Vec<(usize, DescriptorDefect)>,
}

impl ValidationSchema {
    /// Build a schema from raw authored definitions
    pub fn synthesize(raw_fields: &[Value]) -> Self {
        let mut schema = Self::default();
        for (position, raw) in raw_fields.iter().enumerate() {
            match FieldDescriptor::from_value(raw) {
                Ok(descriptor) => schema.push(position, descriptor),
                Err(defect) => schema.skip(position, defect),
            }
        }
        debug!(fields = schema.len(), skipped = schema.skipped.len(), "synthesized validation schema");
        schema
    }

    /// Build a schema from already-typed descriptors
    pub fn from_descriptors(descriptors: &[FieldDescriptor]) -> Self {
        let mut schema = Self::default();
        for (position, descriptor) in descriptors.iter().enumerate() {
            match descriptor.verify() {
                Ok(()) => schema.push(position, descriptor.clone()),
                Err(defect) => schema.skip(position, defect),
            }
        }
        debug!(fields = schema.len(), skipped = schema.skipped.len(), "synthesized validation schema");
        schema
    }

    /// First definition of an id wins
    fn push(&mut self, position: usize, descriptor: FieldDescriptor) {
        if self.contains(&descriptor.id) {
            self.skip(position, DescriptorDefect::DuplicateId(descriptor.id));
            return;
        }
        let rule = FieldRule::for_descriptor(&descriptor);
        self.fields.push(SchemaField { descriptor, rule });
    }

    fn skip(&mut self, position: usize, defect: DescriptorDefect) {
        warn!(position, defect = %defect, "skipping malformed field definition");
        self.skipped.push((position, defect));
    }

    /// Authoring defects found while synthesizing
    pub fn skipped(&self) -> &[(usize, DescriptorDefect)] {
        &self.skipped
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, field_id: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.descriptor.id == field_id)
    }

    pub fn contains(&self, field_id: &str) -> bool {
        self.field(field_id).is_some()
    }

    /// Zero value of every field
    pub fn default_values(&self) -> Payload {
        self.fields
            .iter()
            .map(|f| (f.descriptor.id.clone(), f.descriptor.zero_value()))
            .collect()
    }

    /// Validate a candidate payload. Pure: the same payload always yields
    /// the same outcome.
    pub fn validate(&self, payload: &Payload) -> ValidationOutcome {
        let mut accepted = Payload::with_capacity(self.fields.len());
        let mut errors = Vec::new();

        for field in &self.fields {
            let id = &field.descriptor.id;
            match field.rule.check(&field.descriptor.label, payload.get(id)) {
                Ok(value) => {
                    accepted.insert(id.clone(), value);
                }
                Err(message) => errors.push(FieldError { field_id: id.clone(), message }),
            }
        }

        for key in payload.keys().filter(|k| !self.contains(k)) {
            debug!(field_id = %key, "dropping value for unknown field");
        }

        if errors.is_empty() {
            ValidationOutcome::Accepted(accepted)
        } else {
            ValidationOutcome::Rejected(errors)
        }
    }

    /// Validate a single field value, as used for inline feedback
    pub fn validate_field(&self, field_id: &str, value: Option<&FieldValue>) -> Option<Result<FieldValue, String>> {
        self.field(field_id)
            .map(|f| f.rule.check(&f.descriptor.label, value))
    }
}
