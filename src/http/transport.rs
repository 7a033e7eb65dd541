use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Proxy};
use serde_json::Value;
use tracing::debug;
use url::form_urlencoded;

use super::types::{HttpMethod, RequestSpec};
use crate::errors::VulnmapError;

/// Raw HTTP response before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, body: body.into() }
    }

    /// 2xx and 3xx count as success.
    pub fn is_ok(&self) -> bool {
        (200..400).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }
}

/// The single network seam. Everything above it is transport-agnostic.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue one request. Errors are transport-level failures only (DNS,
    /// refused connection, timeout); any HTTP status is an `Ok`.
    async fn send(
        &self,
        method: HttpMethod,
        spec: &RequestSpec,
        timeout: Duration,
    ) -> Result<RawResponse, VulnmapError>;
}

pub struct ReqwestTransport {
    verified: Client,
    insecure: Client,
}

impl ReqwestTransport {
    fn client(&self, verify_tls: bool) -> &Client {
        if verify_tls { &self.verified } else { &self.insecure }
    }

    pub fn new() -> Result<Self, VulnmapError> {
        Self::with_proxy(None)
    }

    pub fn with_proxy(proxy: Option<&str>) -> Result<Self, VulnmapError> {
        Ok(Self {
            verified: build_client(proxy, false)?,
            insecure: build_client(proxy, true)?,
        })
    }
}

fn build_client(proxy: Option<&str>, accept_invalid_certs: bool) -> Result<Client, VulnmapError> {
    let mut builder = Client::builder()
        .user_agent(concat!("vulnmap/", env!("CARGO_PKG_VERSION")))
        .danger_accept_invalid_certs(accept_invalid_certs);
    if let Some(url) = proxy {
        let proxy = Proxy::all(url)
            .map_err(|e| VulnmapError::Config(format!("Invalid proxy URL {}: {}", url, e)))?;
        builder = builder.proxy(proxy);
    }
    builder
        .build()
        .map_err(|e| VulnmapError::Config(format!("Failed to build HTTP client: {}", e)))
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Post => Method::POST,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Patch => Method::PATCH,
    }
}

fn multipart_form(spec: &RequestSpec) -> Result<Form, VulnmapError> {
    let mut form = Form::new();
    for (name, value) in body_fields(spec)? {
        form = form.text(name, value);
    }
    for attachment in &spec.attachments {
        let mut part = Part::bytes(attachment.content.clone()).file_name(attachment.file_name.clone());
        if let Some(mime) = &attachment.mime {
            part = part.mime_str(mime).map_err(|e| {
                VulnmapError::InvalidArgument(format!("Invalid attachment MIME type {}: {}", mime, e))
            })?;
        }
        form = form.part(attachment.field.clone(), part);
    }
    Ok(form)
}

/// Body content as name/value pairs: a raw body must be form-encoded text,
/// a JSON body must be an object.
fn body_fields(spec: &RequestSpec) -> Result<Vec<(String, String)>, VulnmapError> {
    if let Some(body) = &spec.body {
        if std::str::from_utf8(body).is_err() {
            return Err(VulnmapError::InvalidArgument(
                "A raw body sent with attachments must be form-encoded text".into(),
            ));
        }
        return Ok(form_urlencoded::parse(body)
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect());
    }
    match &spec.json {
        None => Ok(Vec::new()),
        Some(Value::Object(fields)) => Ok(fields
            .iter()
            .map(|(name, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (name.clone(), text)
            })
            .collect()),
        Some(_) => Err(VulnmapError::InvalidArgument(
            "A JSON body sent with attachments must be an object".into(),
        )),
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        method: HttpMethod,
        spec: &RequestSpec,
        timeout: Duration,
    ) -> Result<RawResponse, VulnmapError> {
        let mut req = self
            .client(spec.verify_tls)
            .request(to_reqwest_method(method), &spec.url)
            .timeout(timeout);

        if let Some(query) = &spec.query {
            req = req.query(query);
        }
        if let Some(headers) = &spec.headers {
            for (name, value) in headers {
                req = req.header(name.as_str(), value.as_str());
            }
        }
        if let Some(auth) = &spec.basic_auth {
            req = req.basic_auth(&auth.username, auth.password.as_ref());
        }
        // A raw body wins over a JSON body. With attachments the body is sent
        // as multipart text fields next to the files.
        if !spec.attachments.is_empty() {
            req = req.multipart(multipart_form(spec)?);
        } else if let Some(body) = &spec.body {
            req = req.body(body.clone());
        } else if let Some(json) = &spec.json {
            req = req.json(json);
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                VulnmapError::Transport(format!("Request to {} timed out after {}s", spec.url, timeout.as_secs()))
            } else {
                VulnmapError::Transport(format!("Request to {} failed: {}", spec.url, e))
            }
        })?;

        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .map_err(|e| VulnmapError::Transport(format!("Failed to read response body: {}", e)))?
            .to_vec();

        debug!(method = %method, url = %spec.url, status, bytes = body.len(), "HTTP response received");

        Ok(RawResponse { status, body })
    }
}
