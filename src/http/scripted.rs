//! In-memory transport that replays canned responses in order.
//!
//! Test double, compiled only for tests or with the `test-util` feature.
//! Every request is recorded so callers can assert on exactly what went out
//! and how many times.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::transport::{RawResponse, Transport};
use super::types::{BasicAuth, HttpMethod, RequestSpec};
use crate::errors::VulnmapError;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub json: Option<Value>,
    pub body: Option<Vec<u8>>,
    pub basic_auth: Option<BasicAuth>,
    /// File names of multipart attachments, in order.
    pub attachments: Vec<String>,
    pub timeout: Duration,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }
}

#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<RawResponse, String>>>,
    fallback: Option<RawResponse>,
    calls: AtomicUsize,
    recorded: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request with the same response once the script is empty.
    pub fn repeating(response: RawResponse) -> Self {
        Self { fallback: Some(response), ..Self::default() }
    }

    pub fn push(self, response: RawResponse) -> Self {
        self.queue(Ok(response));
        self
    }

    pub fn push_json(self, status: u16, body: &Value) -> Self {
        self.push(RawResponse::new(status, body.to_string()))
    }

    pub fn push_transport_error(self, message: &str) -> Self {
        self.queue(Err(message.to_string()));
        self
    }

    fn queue(&self, entry: Result<RawResponse, String>) {
        self.script.lock().unwrap_or_else(|e| e.into_inner()).push_back(entry);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.recorded.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        method: HttpMethod,
        spec: &RequestSpec,
        timeout: Duration,
    ) -> Result<RawResponse, VulnmapError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.recorded.lock().unwrap_or_else(|e| e.into_inner()).push(RecordedRequest {
            method,
            url: spec.url.clone(),
            query: spec.query.clone().unwrap_or_default(),
            headers: spec.headers.clone().unwrap_or_default(),
            json: spec.json.clone(),
            body: spec.body.clone(),
            basic_auth: spec.basic_auth.clone(),
            attachments: spec.attachments.iter().map(|a| a.file_name.clone()).collect(),
            timeout,
        });

        let next = self.script.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(VulnmapError::Transport(message)),
            None => self
                .fallback
                .clone()
                .ok_or_else(|| VulnmapError::Transport(format!("No scripted response for {} {}", method, spec.url))),
        }
    }
}
