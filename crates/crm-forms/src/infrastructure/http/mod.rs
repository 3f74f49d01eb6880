//! REST adapter
//!
//! Talks to the CRM platform API. Responses use the platform envelope:
//! `{"data": ...}` on success and `{"error": "..."}` on failure.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::application::dto::{SubmissionReceipt, SubmissionRequest};
use crate::domain::aggregates::FormDefinition;
use crate::domain::value_objects::FormId;
use crate::ports::outbound::{FormSource, SinkError, SourceError, SubmissionSink};

/// API gateway
pub struct ApiGateway {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl ApiGateway {
    /// Request timeouts are owned by the transport, not the session
    pub fn new(base_url: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(String::from),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.header("Authorization", format!("Bearer {}", key)),
            None => req,
        }
    }

    async fn read_envelope(resp: reqwest::Response) -> Result<(StatusCode, serde_json::Value), String> {
        let status = resp.status();
        let body = resp.text().await.map_err(|e| e.to_string())?;
        if body.trim().is_empty() {
            return Ok((status, serde_json::Value::Null));
        }
        let json = serde_json::from_str(&body).map_err(|e| format!("invalid response body: {}", e))?;
        Ok((status, json))
    }
}

/// Pull the payload out of a success envelope
pub fn unwrap_data<T: DeserializeOwned>(envelope: &serde_json::Value) -> Result<T, String> {
    match envelope.get("data") {
        Some(data) => serde_json::from_value(data.clone()).map_err(|e| e.to_string()),
        None => Err("No data in response".into()),
    }
}

/// Form definition from a success envelope, keyed by the id it was requested under
pub fn form_from_envelope(form_id: &FormId, envelope: &serde_json::Value) -> Result<FormDefinition, SourceError> {
    let mut definition: FormDefinition = unwrap_data(envelope).map_err(SourceError::Transport)?;
    if definition.id != *form_id {
        debug!(requested = %form_id, returned = %definition.id, "form id missing or different in response");
        definition.id = form_id.clone();
    }
    Ok(definition)
}

/// Error text of a failure envelope, falling back to the HTTP status
pub fn error_message(status: StatusCode, envelope: &serde_json::Value) -> String {
    envelope
        .get("error")
        .or_else(|| envelope.get("message"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("request failed with status {}", status))
}

/// Map a failed submission response to the sink error shown to the user
pub fn sink_error(status: StatusCode, envelope: &serde_json::Value) -> SinkError {
    match status {
        StatusCode::NOT_FOUND => SinkError::NotFound,
        StatusCode::CONFLICT | StatusCode::GONE => SinkError::FormClosed,
        StatusCode::TOO_MANY_REQUESTS => SinkError::RateLimited,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            SinkError::Rejected(error_message(status, envelope))
        }
        _ => SinkError::Transport(error_message(status, envelope)),
    }
}

#[async_trait]
impl FormSource for ApiGateway {
    async fn fetch_form(&self, form_id: &FormId) -> Result<FormDefinition, SourceError> {
        let url = format!("{}/forms/{}", self.base_url, form_id);
        debug!(%url, "fetching form definition");

        let resp = self.authorize(self.client.get(&url)).send().await
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        let (status, envelope) = Self::read_envelope(resp).await.map_err(SourceError::Transport)?;

        match status {
            s if s.is_success() => form_from_envelope(form_id, &envelope),
            StatusCode::NOT_FOUND => Err(SourceError::NotFound(form_id.clone())),
            s => Err(SourceError::Transport(error_message(s, &envelope))),
        }
    }
}

#[async_trait]
impl SubmissionSink for ApiGateway {
    async fn submit(&self, request: SubmissionRequest) -> Result<SubmissionReceipt, SinkError> {
        let url = format!("{}/forms/{}/submissions", self.base_url, request.form_id);
        debug!(%url, "posting submission");

        let resp = self.authorize(self.client.post(&url).json(&request)).send().await
            .map_err(|e| SinkError::Transport(e.to_string()))?;
        let (status, envelope) = Self::read_envelope(resp).await.map_err(SinkError::Transport)?;

        if status.is_success() {
            unwrap_data(&envelope).map_err(SinkError::Transport)
        } else {
            Err(sink_error(status, &envelope))
        }
    }
}
