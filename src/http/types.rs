use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ErrorKind, VulnmapError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = VulnmapError;

    /// Method names are matched exactly; `get` is not `GET`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Self::Get),
            "PUT" => Ok(Self::Put),
            "POST" => Ok(Self::Post),
            "DELETE" => Ok(Self::Delete),
            "PATCH" => Ok(Self::Patch),
            other => Err(VulnmapError::InvalidArgument(format!("Unsupported HTTP method: {}", other))),
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: Option<String>,
}

/// A file sent as a multipart form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub field: String,
    pub file_name: String,
    pub content: Vec<u8>,
    pub mime: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Text,
    Binary,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub folder: PathBuf,
    pub filename: String,
}

impl Download {
    pub fn path(&self) -> PathBuf {
        self.folder.join(&self.filename)
    }
}

/// How the response body is turned into a payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseOptions {
    pub download: Option<Download>,
    /// `None` means "parse as JSON".
    pub response_type: Option<ResponseType>,
    /// Returned verbatim on success instead of inspecting the body.
    pub substitute: Option<Payload>,
}

/// Everything needed to issue one HTTP call.
///
/// `method` stays a plain string until execution so that an unsupported
/// method is reported as an error result rather than being unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: String,
    pub url: String,
    pub query: Option<BTreeMap<String, String>>,
    pub json: Option<Value>,
    pub body: Option<Vec<u8>>,
    pub headers: Option<BTreeMap<String, String>>,
    pub basic_auth: Option<BasicAuth>,
    pub verify_tls: bool,
    pub attachments: Vec<Attachment>,
    pub retry_count: Option<u32>,
    pub retry_backoff_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub response: ResponseOptions,
}

impl RequestSpec {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            query: None,
            json: None,
            body: None,
            headers: None,
            basic_auth: None,
            verify_tls: true,
            attachments: Vec::new(),
            retry_count: None,
            retry_backoff_secs: None,
            timeout_secs: None,
            response: ResponseOptions::default(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get.as_str(), url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post.as_str(), url)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.get_or_insert_with(BTreeMap::new).insert(key.into(), value.into());
        self
    }

    pub fn query_map(mut self, params: BTreeMap<String, String>) -> Self {
        self.query.get_or_insert_with(BTreeMap::new).extend(params);
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.get_or_insert_with(BTreeMap::new).insert(key.into(), value.into());
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn basic_auth(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.basic_auth = Some(BasicAuth { username: username.into(), password });
        self
    }

    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn insecure(mut self) -> Self {
        self.verify_tls = false;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn retries(mut self, count: u32, backoff_secs: u64) -> Self {
        self.retry_count = Some(count);
        self.retry_backoff_secs = Some(backoff_secs);
        self
    }

    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response.response_type = Some(response_type);
        self
    }

    pub fn download_to(mut self, folder: impl Into<PathBuf>, filename: impl Into<String>) -> Self {
        self.response.download = Some(Download { folder: folder.into(), filename: filename.into() });
        self
    }

    pub fn substitute(mut self, payload: Payload) -> Self {
        self.response.substitute = Some(payload);
        self
    }
}

/// Normalized response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
    Json(Value),
    File(PathBuf),
}

impl Payload {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Short human-readable rendering, used for error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Text(t) => t.clone(),
            Self::Binary(b) => format!("<{} bytes>", b.len()),
            Self::Json(v) => v.to_string(),
            Self::File(p) => p.display().to_string(),
        }
    }
}

/// Outcome of one executed request: fully success-shaped or fully
/// error-shaped, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "execution_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionResult {
    Success {
        status: u16,
        payload: Payload,
    },
    Error {
        kind: ErrorKind,
        message: String,
        status: Option<u16>,
        payload: Option<Payload>,
    },
}

impl ExecutionResult {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Error { kind, message: message.into(), status: None, payload: None }
    }

    pub fn from_error(err: &VulnmapError) -> Self {
        let status = match err {
            VulnmapError::UpstreamServer { status, .. } => Some(*status),
            VulnmapError::UpstreamClient { status, .. } => *status,
            _ => None,
        };
        Self::Error { kind: err.kind(), message: err.to_string(), status, payload: None }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Success { status, .. } => Some(*status),
            Self::Error { status, .. } => *status,
        }
    }

    pub fn payload(&self) -> Option<&Payload> {
        match self {
            Self::Success { payload, .. } => Some(payload),
            Self::Error { payload, .. } => payload.as_ref(),
        }
    }

    /// JSON body of a successful result.
    pub fn json(&self) -> Option<&Value> {
        match self {
            Self::Success { payload, .. } => payload.as_json(),
            Self::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Error { message, .. } => Some(message),
        }
    }

    /// Convert into a `Result`, mapping error-shaped results onto the error
    /// taxonomy.
    pub fn into_result(self) -> Result<(u16, Payload), VulnmapError> {
        match self {
            Self::Success { status, payload } => Ok((status, payload)),
            Self::Error { kind, message, status, .. } => Err(match kind {
                ErrorKind::UpstreamServer => VulnmapError::UpstreamServer {
                    status: status.unwrap_or(500),
                    message,
                },
                ErrorKind::UpstreamClient | ErrorKind::Decode => VulnmapError::UpstreamClient { status, message },
                ErrorKind::Transport => VulnmapError::Transport(message),
                ErrorKind::Configuration | ErrorKind::InvalidMethod => VulnmapError::Config(message),
                ErrorKind::InvalidArgument => VulnmapError::InvalidArgument(message),
                ErrorKind::Format => VulnmapError::Format(message),
                ErrorKind::ContractViolation => VulnmapError::ContractViolation(message),
                ErrorKind::Io => VulnmapError::Io(std::io::Error::other(message)),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_parse_exact() {
        assert_eq!("GET".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("PATCH".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
        assert!("get".parse::<HttpMethod>().is_err());
        assert!("HEAD".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn test_builder_accumulates_query_and_headers() {
        let spec = RequestSpec::get("https://example.test/api")
            .query("a", "1")
            .query("b", "2")
            .header("apiKey", "k");
        assert_eq!(spec.query.as_ref().unwrap().len(), 2);
        assert_eq!(spec.headers.as_ref().unwrap()["apiKey"], "k");
        assert!(spec.verify_tls);
        assert_eq!(spec.method, "GET");
    }

    #[test]
    fn test_into_result_maps_status_to_taxonomy() {
        let server = ExecutionResult::Error {
            kind: ErrorKind::UpstreamServer,
            message: "boom".into(),
            status: Some(503),
            payload: None,
        };
        assert!(matches!(server.into_result(), Err(VulnmapError::UpstreamServer { status: 503, .. })));

        let client = ExecutionResult::Error {
            kind: ErrorKind::UpstreamClient,
            message: "nope".into(),
            status: Some(404),
            payload: None,
        };
        assert!(matches!(client.into_result(), Err(VulnmapError::UpstreamClient { status: Some(404), .. })));

        let transport = ExecutionResult::error(ErrorKind::Transport, "dns");
        assert!(matches!(transport.into_result(), Err(VulnmapError::Transport(_))));
    }

    #[test]
    fn test_success_accessors() {
        let result = ExecutionResult::Success { status: 200, payload: Payload::Json(json!({"ok": true})) };
        assert!(result.is_success());
        assert_eq!(result.status(), Some(200));
        assert_eq!(result.json().unwrap()["ok"], true);
        assert!(result.error_message().is_none());
    }

    #[test]
    fn test_serialized_shape_is_tagged() {
        let result = ExecutionResult::error(ErrorKind::InvalidMethod, "bad");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["execution_status"], "ERROR");
        assert_eq!(value["kind"], "invalid_method");
    }
}
