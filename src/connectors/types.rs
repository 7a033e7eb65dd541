use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::VulnmapError;
use crate::http::RequestSpec;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self { role: "system".to_string(), content: content.to_string() }
    }
    pub fn user(content: &str) -> Self {
        Self { role: "user".to_string(), content: content.to_string() }
    }
}

/// CVSS v3 severity accepted by the search filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = VulnmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            other => Err(VulnmapError::InvalidArgument(format!(
                "Invalid severity '{}': expected LOW, MEDIUM, HIGH or CRITICAL", other
            ))),
        }
    }
}

pub const MAX_PAGE_SIZE: u32 = 2000;

/// Filters for a vulnerability listing. Unset filters are left out of the
/// query entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub severity: Option<Severity>,
    pub cwe_id: Option<String>,
    pub keyword: Option<String>,
    /// Both dates or neither.
    pub published_start: Option<String>,
    pub published_end: Option<String>,
    pub page_size: Option<u32>,
    pub start_index: Option<u32>,
    /// Provider-specific parameters merged after the typed filters.
    #[serde(default)]
    pub extra_params: BTreeMap<String, String>,
}

impl SearchFilters {
    pub fn validate(&self) -> Result<(), VulnmapError> {
        if self.published_start.is_some() != self.published_end.is_some() {
            return Err(VulnmapError::InvalidArgument(
                "To filter by publication date, both start and end dates need to be given".into(),
            ));
        }
        if let Some(size) = self.page_size {
            if size == 0 || size > MAX_PAGE_SIZE {
                return Err(VulnmapError::InvalidArgument(format!(
                    "Page size must be between 1 and {}", MAX_PAGE_SIZE
                )));
            }
        }
        Ok(())
    }
}

/// Request defaults a connector stamps onto every `RequestSpec` it builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorSettings {
    pub timeout_secs: Option<u64>,
    pub retry_count: Option<u32>,
    pub retry_backoff_secs: Option<u64>,
    pub verify_tls: bool,
    /// Timeout for chat completions; falls back to the 600 s chat default,
    /// never to `timeout_secs`.
    pub chat_timeout_secs: Option<u64>,
}

impl Default for ConnectorSettings {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            retry_count: None,
            retry_backoff_secs: None,
            verify_tls: true,
            chat_timeout_secs: None,
        }
    }
}

impl ConnectorSettings {
    pub fn apply(&self, mut spec: RequestSpec) -> RequestSpec {
        if spec.timeout_secs.is_none() {
            spec.timeout_secs = self.timeout_secs;
        }
        if spec.retry_count.is_none() {
            spec.retry_count = self.retry_count;
        }
        if spec.retry_backoff_secs.is_none() {
            spec.retry_backoff_secs = self.retry_backoff_secs;
        }
        spec.verify_tls = spec.verify_tls && self.verify_tls;
        spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_date_rejected() {
        let start_only = SearchFilters { published_start: Some("2024-01-01T00:00:00.000".into()), ..Default::default() };
        assert!(matches!(start_only.validate(), Err(VulnmapError::InvalidArgument(_))));

        let end_only = SearchFilters { published_end: Some("2024-02-01T00:00:00.000".into()), ..Default::default() };
        assert!(end_only.validate().is_err());
    }

    #[test]
    fn test_date_pair_accepted() {
        let filters = SearchFilters {
            published_start: Some("2024-01-01T00:00:00.000".into()),
            published_end: Some("2024-02-01T00:00:00.000".into()),
            ..Default::default()
        };
        assert!(filters.validate().is_ok());
    }

    #[test]
    fn test_page_size_bounds() {
        let zero = SearchFilters { page_size: Some(0), ..Default::default() };
        assert!(zero.validate().is_err());
        let max = SearchFilters { page_size: Some(2000), ..Default::default() };
        assert!(max.validate().is_ok());
        let over = SearchFilters { page_size: Some(2001), ..Default::default() };
        assert!(over.validate().is_err());
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!("critical".parse::<Severity>().unwrap(), Severity::Critical);
        assert_eq!("HIGH".parse::<Severity>().unwrap(), Severity::High);
        assert!("severe".parse::<Severity>().is_err());
    }

    #[test]
    fn test_settings_do_not_override_explicit_values() {
        let settings = ConnectorSettings {
            timeout_secs: Some(30),
            retry_count: Some(2),
            retry_backoff_secs: Some(5),
            verify_tls: true,
            chat_timeout_secs: None,
        };
        let spec = settings.apply(RequestSpec::get("https://example.test").timeout_secs(600));
        assert_eq!(spec.timeout_secs, Some(600));
        assert_eq!(spec.retry_count, Some(2));
        assert_eq!(spec.retry_backoff_secs, Some(5));
    }
}
