//! Submission Aggregate
//!
//! One accepted response to a form. Append-only: once created nothing in
//! this crate edits it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{FormId, Payload, SubmissionId};

/// Where a submission came from
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    /// Free-form channel tag, e.g. "embed" or "cli"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    id: SubmissionId,
    form_id: FormId,
    data: Payload,
    metadata: SubmissionMetadata,
    submitted_at: DateTime<Utc>,
}

impl Submission {
    pub fn create(form_id: FormId, data: Payload, metadata: SubmissionMetadata) -> Self {
        Self { id: SubmissionId::new(), form_id, data, metadata, submitted_at: Utc::now() }
    }

    pub fn id(&self) -> &SubmissionId { &self.id }
    pub fn form_id(&self) -> &FormId { &self.form_id }
    pub fn data(&self) -> &Payload { &self.data }
    pub fn metadata(&self) -> &SubmissionMetadata { &self.metadata }
    pub fn submitted_at(&self) -> DateTime<Utc> { self.submitted_at }
}
