//! Client for the remote import API.

use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::error::LoadError;

/// Default timeout for a single import request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Token lifetime requested at authentication.
const TOKEN_EXPIRY: &str = "1h";

/// Where imports are created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTarget {
    pub base_url: String,
    pub container_id: String,
    pub data_source_id: String,
}

impl ImportTarget {
    pub fn new(
        base_url: impl Into<String>,
        container_id: impl Into<String>,
        data_source_id: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            container_id: container_id.into(),
            data_source_id: data_source_id.into(),
        }
    }

    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn token_url(&self) -> String {
        format!("{}/oauth/token", self.base())
    }

    pub fn imports_url(&self) -> String {
        format!(
            "{}/containers/{}/import/datasources/{}/imports",
            self.base(),
            self.container_id,
            self.data_source_id
        )
    }
}

impl fmt::Display for ImportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "container {} / data source {} at {}",
            self.container_id,
            self.data_source_id,
            self.base()
        )
    }
}

/// Status reported for a created import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportStatus {
    Ready,
    Queued,
    Processing,
    Completed,
    Error,
    Stopped,
    Other(String),
}

impl ImportStatus {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "ready" => Self::Ready,
            "queued" => Self::Queued,
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "error" => Self::Error,
            "stopped" => Self::Stopped,
            _ => Self::Other(value.to_string()),
        }
    }

    /// In progress or done; the chunk counts as loaded.
    pub fn is_accepted(&self) -> bool {
        matches!(
            self,
            Self::Ready | Self::Queued | Self::Processing | Self::Completed
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Ready => "ready",
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Stopped => "stopped",
            Self::Other(value) => value,
        }
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one create-import call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResponse {
    pub id: Option<String>,
    pub status: ImportStatus,
}

impl ImportResponse {
    pub fn new(id: Option<String>, status: ImportStatus) -> Self {
        Self { id, status }
    }

    /// Parse the API envelope `{"value": {...}, "isError": bool}`.
    ///
    /// A missing status means the import was created and is treated as ready.
    pub fn from_envelope(url: &str, body: &Value) -> Result<Self, LoadError> {
        let Some(envelope) = body.as_object() else {
            return Err(LoadError::InvalidResponse {
                url: url.to_string(),
                message: "expected a JSON object".to_string(),
            });
        };
        if envelope.get("isError").and_then(Value::as_bool) == Some(true) {
            let message = envelope
                .get("error")
                .map(|error| match error {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .unwrap_or_else(|| "no error detail".to_string());
            return Err(LoadError::Api { message });
        }
        let value = envelope.get("value").unwrap_or(&Value::Null);
        let id = match value.get("id") {
            Some(Value::String(id)) => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        };
        let status = value
            .get("status")
            .and_then(Value::as_str)
            .map_or(ImportStatus::Ready, ImportStatus::parse);
        Ok(Self { id, status })
    }
}

/// Sends one chunk of node records as an import.
pub trait ImportClient {
    fn create_import(&mut self, nodes: &[Value]) -> Result<ImportResponse, LoadError>;

    fn describe(&self) -> String;
}

/// Import body with the given nodes and no edges.
pub fn import_payload(nodes: &[Value]) -> Value {
    json!({ "data": { "nodes": nodes, "edges": [] } })
}

/// Blocking HTTP client for the import API.
pub struct HttpImportClient {
    client: Client,
    target: ImportTarget,
    token: Option<String>,
}

impl HttpImportClient {
    pub fn new(target: ImportTarget, timeout: Duration) -> Result<Self, LoadError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| LoadError::Network {
                url: target.base_url.clone(),
                source,
            })?;
        Ok(Self {
            client,
            target,
            token: None,
        })
    }

    /// Use a pre-issued bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Exchange an API key pair for a bearer token.
    pub fn authenticate(&mut self, key: &str, secret: &str) -> Result<(), LoadError> {
        let url = self.target.token_url();
        debug!(%url, "requesting access token");
        let response = self
            .client
            .get(&url)
            .header("x-api-key", key)
            .header("x-api-secret", secret)
            .header("x-api-expiry", TOKEN_EXPIRY)
            .send()
            .map_err(|source| LoadError::Network {
                url: url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LoadError::Auth {
                message: format!("HTTP {status}: {message}"),
            });
        }

        let body = response.text().map_err(|source| LoadError::Network {
            url: url.clone(),
            source,
        })?;
        let token = token_from_body(&body).ok_or_else(|| LoadError::Auth {
            message: "token endpoint returned no token".to_string(),
        })?;
        info!(import_target = %self.target, "authenticated");
        self.token = Some(token);
        Ok(())
    }
}

/// The token endpoint answers with a JSON string, a `{"value": ...}`
/// envelope, or bare text.
fn token_from_body(body: &str) -> Option<String> {
    let token = match serde_json::from_str::<Value>(body) {
        Ok(Value::String(token)) => token,
        Ok(Value::Object(map)) => map.get("value")?.as_str()?.to_string(),
        _ => body.trim().to_string(),
    };
    (!token.is_empty()).then_some(token)
}

impl ImportClient for HttpImportClient {
    fn create_import(&mut self, nodes: &[Value]) -> Result<ImportResponse, LoadError> {
        let url = self.target.imports_url();
        let mut request = self.client.post(&url).json(&import_payload(nodes));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().map_err(|source| LoadError::Network {
            url: url.clone(),
            source,
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LoadError::Http {
                url,
                status,
                message,
            });
        }

        let body: Value = response.json().map_err(|source| LoadError::Network {
            url: url.clone(),
            source,
        })?;
        ImportResponse::from_envelope(&url, &body)
    }

    fn describe(&self) -> String {
        format!("import API ({})", self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_ignore_trailing_slash() {
        let target = ImportTarget::new("http://localhost:8090/", "1", "2");
        assert_eq!(target.token_url(), "http://localhost:8090/oauth/token");
        assert_eq!(
            target.imports_url(),
            "http://localhost:8090/containers/1/import/datasources/2/imports"
        );
    }

    #[test]
    fn payload_wraps_nodes_with_empty_edges() {
        let payload = import_payload(&[json!({"id": "EQ1"})]);
        assert_eq!(
            payload,
            json!({"data": {"nodes": [{"id": "EQ1"}], "edges": []}})
        );
    }

    #[test]
    fn envelope_status_and_id() {
        let body = json!({"value": {"id": 42, "status": "Queued"}, "isError": false});
        let response = ImportResponse::from_envelope("u", &body).unwrap();
        assert_eq!(response.id.as_deref(), Some("42"));
        assert_eq!(response.status, ImportStatus::Queued);
        assert!(response.status.is_accepted());
    }

    #[test]
    fn missing_status_counts_as_ready() {
        let body = json!({"value": {"id": "abc"}, "isError": false});
        let response = ImportResponse::from_envelope("u", &body).unwrap();
        assert_eq!(response.status, ImportStatus::Ready);
    }

    #[test]
    fn error_envelope_is_an_api_error() {
        let body = json!({"isError": true, "error": "bad data source"});
        match ImportResponse::from_envelope("u", &body) {
            Err(LoadError::Api { message }) => assert_eq!(message, "bad data source"),
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_statuses_are_not_accepted() {
        assert!(!ImportStatus::parse("error").is_accepted());
        assert!(!ImportStatus::parse("stopped").is_accepted());
        assert_eq!(ImportStatus::parse("weird").as_str(), "weird");
    }

    #[test]
    fn token_body_shapes() {
        assert_eq!(token_from_body("\"abc\"").as_deref(), Some("abc"));
        assert_eq!(token_from_body("{\"value\":\"xyz\"}").as_deref(), Some("xyz"));
        assert_eq!(token_from_body("raw-token\n").as_deref(), Some("raw-token"));
        assert_eq!(token_from_body("  "), None);
    }
}
