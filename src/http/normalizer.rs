use serde_json::Value;
use tracing::warn;

use super::constants::{MAX_ERROR_BODY_CHARS, NO_DATA_RETURNED};
use super::transport::RawResponse;
use super::types::{ExecutionResult, Payload, ResponseOptions, ResponseType};
use crate::errors::ErrorKind;

/// Turn a raw response into an `ExecutionResult`.
///
/// A non-2xx/3xx status is always error-shaped, whatever the options say.
/// For successful statuses the options apply in order: substitute payload,
/// download to disk, empty-body sentinel, explicit response type, and
/// finally JSON parsing.
pub async fn normalize(raw: RawResponse, options: &ResponseOptions) -> ExecutionResult {
    let status = raw.status;

    if !raw.is_ok() {
        return error_from_status(raw);
    }

    if let Some(payload) = &options.substitute {
        return ExecutionResult::Success { status, payload: payload.clone() };
    }

    if let Some(download) = &options.download {
        let path = download.path();
        return match tokio::fs::write(&path, &raw.body).await {
            Ok(()) => ExecutionResult::Success { status, payload: Payload::File(path) },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to save downloaded response");
                ExecutionResult::Error {
                    kind: ErrorKind::Io,
                    message: format!("Failed to write {}: {}", path.display(), e),
                    status: Some(status),
                    payload: None,
                }
            }
        };
    }

    if raw.body.is_empty() {
        return ExecutionResult::Success { status, payload: Payload::Text(NO_DATA_RETURNED.to_string()) };
    }

    match options.response_type {
        Some(ResponseType::Binary) => ExecutionResult::Success { status, payload: Payload::Binary(raw.body) },
        Some(ResponseType::Text) => match String::from_utf8(raw.body) {
            Ok(text) => ExecutionResult::Success { status, payload: Payload::Text(text) },
            Err(e) => decode_error(status, format!("Response body is not valid UTF-8: {}", e)),
        },
        Some(ResponseType::Json) | None => match serde_json::from_slice::<Value>(&raw.body) {
            Ok(value) => ExecutionResult::Success { status, payload: Payload::Json(value) },
            Err(e) => decode_error(status, format!("Failed to parse JSON response: {}", e)),
        },
    }
}

fn decode_error(status: u16, message: String) -> ExecutionResult {
    ExecutionResult::Error { kind: ErrorKind::Decode, message, status: Some(status), payload: None }
}

fn error_from_status(raw: RawResponse) -> ExecutionResult {
    let status = raw.status;
    let kind = if raw.is_server_error() { ErrorKind::UpstreamServer } else { ErrorKind::UpstreamClient };

    let payload = match serde_json::from_slice::<Value>(&raw.body) {
        Ok(value) => Some(Payload::Json(value)),
        Err(_) if raw.body.is_empty() => None,
        Err(_) => Some(Payload::Text(String::from_utf8_lossy(&raw.body).into_owned())),
    };

    let detail = payload.as_ref().and_then(error_detail);
    let message = match detail {
        Some(detail) => format!("HTTP {}: {}", status, detail),
        None => format!("HTTP {}", status),
    };

    ExecutionResult::Error { kind, message, status: Some(status), payload }
}

/// Best human-readable detail from an error body.
fn error_detail(payload: &Payload) -> Option<String> {
    let text = match payload {
        Payload::Json(value) => value
            .pointer("/error/message")
            .or_else(|| value.get("message"))
            .or_else(|| value.get("error"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| value.to_string()),
        Payload::Text(text) => text.trim().to_string(),
        _ => return None,
    };
    if text.is_empty() {
        return None;
    }
    Some(text.chars().take(MAX_ERROR_BODY_CHARS).collect())
}
