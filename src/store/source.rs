use std::{fmt, time::Duration};

use async_trait::async_trait;
use serde_json::Value;

use super::send_store_request;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    InvalidUrl { url: String, message: String },
    Transport(String),
    Status { status: u16, body: String },
    InvalidJson(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::InvalidUrl { url, message } => {
                write!(f, "invalid database URL {url}: {message}")
            }
            StoreError::Transport(message) => write!(f, "request failed: {message}"),
            StoreError::Status { status, body } if body.is_empty() => {
                write!(f, "store responded with HTTP {status}")
            }
            StoreError::Status { status, body } => {
                write!(f, "store responded with HTTP {status}: {body}")
            }
            StoreError::InvalidJson(message) => write!(f, "response is not JSON: {message}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Result of a one-shot read at a path.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    value: Value,
    size_bytes: usize,
}

impl Snapshot {
    pub fn new(value: Value, size_bytes: usize) -> Self {
        Self { value, size_bytes }
    }

    pub fn from_body(body: &[u8]) -> Result<Self, StoreError> {
        let value = serde_json::from_slice(body)
            .map_err(|err| StoreError::InvalidJson(err.to_string()))?;
        Ok(Self::new(value, body.len()))
    }

    /// The store answers `null` for a path that holds nothing.
    pub fn exists(&self) -> bool {
        !self.value.is_null()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }
}

/// Read-only access to the document store.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn get(&self, path: &str) -> Result<Snapshot, StoreError>;
}

/// Realtime Database REST endpoint: `GET {base}/{path}.json`.
#[derive(Debug, Clone)]
pub struct FirebaseSource {
    http: reqwest::Client,
    base_url: reqwest::Url,
    auth_token: Option<String>,
}

impl FirebaseSource {
    pub fn new(
        database_url: &str,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let invalid = |message: String| StoreError::InvalidUrl {
            url: database_url.to_string(),
            message,
        };
        let mut base_url =
            reqwest::Url::parse(database_url.trim()).map_err(|err| invalid(err.to_string()))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(invalid("expected an http or https URL".to_string()));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| StoreError::Transport(err.to_string()))?;
        Ok(Self {
            http,
            base_url,
            auth_token: auth_token.filter(|token| !token.is_empty()),
        })
    }

    pub fn url_for(&self, path: &str) -> Result<reqwest::Url, StoreError> {
        let path = path.trim_matches('/');
        let mut url = self
            .base_url
            .join(&format!("{path}.json"))
            .map_err(|err| StoreError::InvalidUrl {
                url: self.base_url.to_string(),
                message: err.to_string(),
            })?;
        if let Some(token) = self.auth_token.as_deref() {
            url.query_pairs_mut().append_pair("auth", token);
        }
        Ok(url)
    }
}

#[async_trait]
impl RecordSource for FirebaseSource {
    async fn get(&self, path: &str) -> Result<Snapshot, StoreError> {
        let url = self.url_for(path)?;
        let span = tracing::debug_span!("StoreGet", path = %path, host = ?url.host_str());
        send_store_request(
            span,
            || async {
                let response = self
                    .http
                    .get(url)
                    .send()
                    .await
                    .map_err(|err| StoreError::Transport(err.to_string()))?;
                let status = response.status();
                let body = response
                    .bytes()
                    .await
                    .map_err(|err| StoreError::Transport(err.to_string()))?;
                if !status.is_success() {
                    return Err(StoreError::Status {
                        status: status.as_u16(),
                        body: error_body(&body),
                    });
                }
                Snapshot::from_body(&body)
            },
            ToString::to_string,
        )
        .await
    }
}

// The REST API reports failures as `{"error": "..."}`.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// The store's `error` message, or the first line of a non-JSON body, capped
/// at [`MAX_ERROR_BODY_CHARS`].
fn error_body(body: &[u8]) -> String {
    let message = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("error") {
            Some(Value::String(message)) => message.clone(),
            _ => String::from_utf8_lossy(body).into_owned(),
        },
        _ => String::from_utf8_lossy(body).into_owned(),
    };
    let line = message.trim().lines().next().unwrap_or("").trim();
    if line.chars().count() > MAX_ERROR_BODY_CHARS {
        let mut capped: String = line.chars().take(MAX_ERROR_BODY_CHARS).collect();
        capped.push('…');
        capped
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(url: &str, token: Option<&str>) -> FirebaseSource {
        FirebaseSource::new(url, token.map(str::to_string), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn builds_rest_urls() {
        let firebase = source("https://mentoring-default-rtdb.firebaseio.com", None);
        assert_eq!(
            firebase.url_for("students").unwrap().as_str(),
            "https://mentoring-default-rtdb.firebaseio.com/students.json"
        );
        assert_eq!(
            firebase.url_for("/students/").unwrap().as_str(),
            "https://mentoring-default-rtdb.firebaseio.com/students.json"
        );
    }

    #[test]
    fn appends_auth_token() {
        let firebase = source("http://127.0.0.1:9000/ns/", Some("s3cret"));
        assert_eq!(
            firebase.url_for("students").unwrap().as_str(),
            "http://127.0.0.1:9000/ns/students.json?auth=s3cret"
        );
        let firebase = source("http://127.0.0.1:9000", Some(""));
        assert_eq!(
            firebase.url_for("students").unwrap().as_str(),
            "http://127.0.0.1:9000/students.json"
        );
    }

    #[test]
    fn rejects_bad_urls() {
        let err = FirebaseSource::new("not a url", None, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidUrl { .. }));
        let err = FirebaseSource::new("ftp://example.com", None, Duration::from_secs(1)).unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn null_snapshot_does_not_exist() {
        let snapshot = Snapshot::from_body(b"null").unwrap();
        assert!(!snapshot.exists());
        assert_eq!(snapshot.size_bytes(), 4);
        let snapshot = Snapshot::from_body(b"[]").unwrap();
        assert!(snapshot.exists());
        assert!(matches!(
            Snapshot::from_body(b"<html>"),
            Err(StoreError::InvalidJson(_))
        ));
    }

    #[test]
    fn extracts_error_messages() {
        assert_eq!(error_body(br#"{"error": "Permission denied"}"#), "Permission denied");
        assert_eq!(error_body(b" gateway timeout \n"), "gateway timeout");
    }

    #[test]
    fn long_error_pages_are_capped() {
        let page = format!("<html>{}\n<body>502</body></html>", "x".repeat(5_000));
        let message = error_body(page.as_bytes());
        assert_eq!(message.chars().count(), MAX_ERROR_BODY_CHARS + 1);
        assert!(message.starts_with("<html>xxx"));
        assert!(message.ends_with('…'));
        assert!(!message.contains("body"));
    }
}
