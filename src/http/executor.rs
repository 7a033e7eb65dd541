use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::constants::{
    AUTH_FAILED, AUTH_SUCCESSFUL, CONNECTION_FAILED, CREDENTIALS_VALID, DEFAULT_TIMEOUT_SECS,
    INVALID_METHOD,
};
use super::normalizer::normalize;
use super::transport::{RawResponse, ReqwestTransport, Transport};
use super::types::{ExecutionResult, HttpMethod, RequestSpec};
use crate::errors::{with_retry, ErrorKind, RetryPolicy, VulnmapError};

/// Result of a credential check against a provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionCheck {
    pub success: bool,
    pub status: Option<u16>,
    pub message: String,
    pub detail: Value,
}

/// Issues requests through a `Transport`, retrying server-side failures.
///
/// Stateless apart from the transport handle, so one executor can be cloned
/// into any number of connectors and concurrent runs.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Executor backed by a real `reqwest` client.
    pub fn with_reqwest(proxy: Option<&str>) -> Result<Self, VulnmapError> {
        Ok(Self::new(Arc::new(ReqwestTransport::with_proxy(proxy)?)))
    }

    pub async fn execute(&self, spec: RequestSpec) -> ExecutionResult {
        let method: HttpMethod = match spec.method.parse() {
            Ok(m) => m,
            Err(_) => {
                warn!(method = %spec.method, url = %spec.url, "Rejected request with invalid method");
                return ExecutionResult::error(ErrorKind::InvalidMethod, INVALID_METHOD);
            }
        };

        let policy = match RetryPolicy::from_settings(spec.retry_count, spec.retry_backoff_secs) {
            Ok(p) => p,
            Err(e) => return ExecutionResult::from_error(&e),
        };
        let timeout = Duration::from_secs(spec.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
        let operation = format!("{} {}", method, spec.url);

        debug!(
            method = %method,
            url = %spec.url,
            timeout_secs = timeout.as_secs(),
            retry_count = policy.retry_count,
            "Executing request"
        );

        let transport = &self.transport;
        let request = &spec;
        let sent = with_retry(
            &operation,
            &policy,
            move || transport.send(method, request, timeout),
            RawResponse::is_server_error,
        )
        .await;

        match sent {
            Ok(raw) => normalize(raw, &spec.response).await,
            Err(e) => {
                warn!(operation = %operation, error = %e, "Request failed at transport level");
                ExecutionResult::from_error(&e)
            }
        }
    }

    /// Single read-only request without retries, reporting whether the supplied
    /// credentials are accepted.
    pub async fn test_connection(&self, spec: RequestSpec) -> ConnectionCheck {
        let method: HttpMethod = match spec.method.parse() {
            Ok(m) => m,
            Err(_) => {
                return ConnectionCheck {
                    success: false,
                    status: None,
                    message: INVALID_METHOD.to_string(),
                    detail: Value::String(spec.method.clone()),
                };
            }
        };
        let timeout = Duration::from_secs(spec.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));

        let raw = match self.transport.send(method, &spec, timeout).await {
            Ok(raw) => raw,
            Err(e) => {
                return ConnectionCheck {
                    success: false,
                    status: None,
                    message: CONNECTION_FAILED.to_string(),
                    detail: Value::String(e.to_string()),
                };
            }
        };

        if raw.is_ok() {
            return ConnectionCheck {
                success: true,
                status: Some(raw.status),
                message: AUTH_SUCCESSFUL.to_string(),
                detail: Value::String(CREDENTIALS_VALID.to_string()),
            };
        }

        let detail = match serde_json::from_slice::<Value>(&raw.body) {
            Ok(value) => value,
            Err(_) if !raw.body.is_empty() => Value::String(String::from_utf8_lossy(&raw.body).into_owned()),
            Err(_) => Value::String(format!("HTTP {}", raw.status)),
        };
        ConnectionCheck {
            success: false,
            status: Some(raw.status),
            message: AUTH_FAILED.to_string(),
            detail,
        }
    }
}
