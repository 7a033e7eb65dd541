use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::credentials::resolve_credential;
use crate::connectors::catalog;
use crate::connectors::ConnectorSettings;

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct VulnmapConfig {
    pub source: Option<SourceConfig>,
    pub analysis: Option<AnalysisConfig>,
    pub http: Option<HttpConfig>,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct SourceConfig {
    pub provider: Option<String>,
    /// Literal key or `$ENV_VAR` reference.
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct AnalysisConfig {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct HttpConfig {
    pub timeout_secs: Option<u64>,
    pub retry_count: Option<u32>,
    pub retry_backoff_secs: Option<u64>,
    pub verify_tls: Option<bool>,
    pub proxy: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct OutputConfig {
    pub directory: Option<PathBuf>,
}

impl VulnmapConfig {
    pub fn source_provider(&self) -> &str {
        self.source
            .as_ref()
            .and_then(|s| s.provider.as_deref())
            .unwrap_or("nvd")
    }

    pub fn analysis_provider(&self) -> &str {
        self.analysis
            .as_ref()
            .and_then(|a| a.provider.as_deref())
            .unwrap_or("openai")
    }

    /// Model name: CLI flag, then config, then the provider's catalog default.
    pub fn model(&self, cli: Option<&str>) -> String {
        cli.map(|s| s.to_string())
            .or_else(|| self.analysis.as_ref().and_then(|a| a.model.clone()))
            .unwrap_or_else(|| catalog::default_model(self.analysis_provider()).to_string())
    }

    pub fn source_api_key(&self, cli: Option<&str>) -> String {
        let configured = self.source.as_ref().and_then(|s| s.api_key.as_deref());
        resolve_key(cli, configured, self.source_provider())
    }

    pub fn analysis_api_key(&self, cli: Option<&str>) -> String {
        let configured = self.analysis.as_ref().and_then(|a| a.api_key.as_deref());
        resolve_key(cli, configured, self.analysis_provider())
    }

    pub fn source_base_url(&self) -> Option<String> {
        self.source.as_ref().and_then(|s| s.base_url.clone())
    }

    pub fn analysis_base_url(&self) -> Option<String> {
        self.analysis.as_ref().and_then(|a| a.base_url.clone())
    }

    pub fn proxy(&self) -> Option<&str> {
        self.http.as_ref().and_then(|h| h.proxy.as_deref())
    }

    pub fn output_directory(&self, cli: Option<PathBuf>) -> PathBuf {
        cli.or_else(|| self.output.as_ref().and_then(|o| o.directory.clone()))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Request defaults stamped onto every connector request.
    pub fn connector_settings(&self) -> ConnectorSettings {
        let http = self.http.clone().unwrap_or_default();
        ConnectorSettings {
            timeout_secs: http.timeout_secs,
            retry_count: http.retry_count,
            retry_backoff_secs: http.retry_backoff_secs,
            verify_tls: http.verify_tls.unwrap_or(true),
            chat_timeout_secs: self.analysis.as_ref().and_then(|a| a.timeout_secs),
        }
    }
}

/// CLI value, then config value (with `$ENV` resolution), then the
/// provider's catalog env var. Empty when none is set.
fn resolve_key(cli: Option<&str>, configured: Option<&str>, provider: &str) -> String {
    if let Some(key) = cli.filter(|k| !k.is_empty()) {
        return key.to_string();
    }
    if let Some(key) = configured.filter(|k| !k.is_empty()) {
        return resolve_credential(key);
    }
    catalog::get_provider(provider)
        .filter(|p| !p.env_var.is_empty())
        .and_then(|p| std::env::var(p.env_var).ok())
        .unwrap_or_default()
}
