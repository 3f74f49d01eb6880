//! Data Transfer Objects (DTOs)
//!
//! Objects for transferring data across boundaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::SubmissionMetadata;
use crate::domain::value_objects::{FieldOption, FieldValue, FormId, Payload, SubmissionId};

// =============================================================================
// Submission envelope
// =============================================================================

/// What a session hands to the submission sink: the accepted values, untouched
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    pub form_id: FormId,
    pub data: Payload,
    #[serde(default)]
    pub metadata: SubmissionMetadata,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub submission_id: SubmissionId,
    pub form_id: FormId,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

// =============================================================================
// Views (Read Models)
// =============================================================================

/// Input widget to render for a field
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControlKind {
    TextInput,
    EmailInput,
    NumberInput,
    TextArea,
    Select { options: Vec<FieldOption>, multiple: bool },
    RadioGroup { options: Vec<FieldOption> },
    Checkbox,
}

/// Fully controlled view of one field: there is always a current value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlView {
    pub field_id: String,
    pub label: String,
    pub control: ControlKind,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    pub value: FieldValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
