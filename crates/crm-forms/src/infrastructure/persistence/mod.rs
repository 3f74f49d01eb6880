//! In-memory repository implementations
//!
//! Used by the CLI and the test-suite; a relational adapter plugs into the
//! same ports.

use std::collections::HashMap;
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::info;

use crate::domain::aggregates::{Form, FormDefinition, Submission};
use crate::domain::value_objects::FormId;
use crate::domain::DomainEvent;
use crate::ports::outbound::{
    EventPublisher, FormRepository, FormSource, RepositoryError, SourceError, SubmissionRepository,
};

/// In-memory form repository
#[derive(Default)]
pub struct InMemoryFormRepository {
    forms: RwLock<HashMap<FormId, Form>>,
}

impl InMemoryFormRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FormRepository for InMemoryFormRepository {
    async fn find_by_id(&self, id: &FormId) -> Result<Option<Form>, RepositoryError> {
        Ok(self.forms.read().get(id).cloned())
    }

    async fn save(&self, form: &Form) -> Result<(), RepositoryError> {
        self.forms.write().insert(form.id().clone(), form.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Form>, RepositoryError> {
        let mut forms: Vec<Form> = self.forms.read().values().cloned().collect();
        forms.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(forms)
    }
}

#[async_trait]
impl FormSource for InMemoryFormRepository {
    async fn fetch_form(&self, form_id: &FormId) -> Result<FormDefinition, SourceError> {
        self.forms
            .read()
            .get(form_id)
            .map(Form::definition)
            .ok_or_else(|| SourceError::NotFound(form_id.clone()))
    }
}

/// In-memory, append-only submission store
#[derive(Default)]
pub struct InMemorySubmissionRepository {
    submissions: RwLock<Vec<Submission>>,
}

impl InMemorySubmissionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubmissionRepository for InMemorySubmissionRepository {
    async fn append(&self, submission: &Submission) -> Result<(), RepositoryError> {
        let mut submissions = self.submissions.write();
        if submissions.iter().any(|s| s.id() == submission.id()) {
            return Err(RepositoryError::DuplicateKey(submission.id().to_string()));
        }
        submissions.push(submission.clone());
        Ok(())
    }

    async fn find_by_form(&self, form_id: &FormId) -> Result<Vec<Submission>, RepositoryError> {
        Ok(self
            .submissions
            .read()
            .iter()
            .filter(|s| s.form_id() == form_id)
            .cloned()
            .collect())
    }

    async fn count_by_form(&self, form_id: &FormId) -> Result<u64, RepositoryError> {
        Ok(self.submissions.read().iter().filter(|s| s.form_id() == form_id).count() as u64)
    }
}

/// Keeps published events for later inspection
#[derive(Default)]
pub struct InMemoryEventPublisher {
    events: RwLock<Vec<DomainEvent>>,
}

impl InMemoryEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.read().clone()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, events: Vec<DomainEvent>) -> Result<(), RepositoryError> {
        self.events.write().extend(events);
        Ok(())
    }
}

/// Writes each event to the log
#[derive(Default)]
pub struct TracingEventPublisher;

#[async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish(&self, events: Vec<DomainEvent>) -> Result<(), RepositoryError> {
        for event in events {
            info!(event_type = event.event_type(), form_id = %event.aggregate_id(), "domain event");
        }
        Ok(())
    }
}
