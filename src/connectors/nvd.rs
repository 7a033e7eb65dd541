use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::provider::VulnerabilitySource;
use super::types::{ConnectorSettings, SearchFilters};
use crate::errors::VulnmapError;
use crate::http::{ConnectionCheck, ExecutionResult, RequestExecutor, RequestSpec};

pub const NVD_BASE_URL: &str = "https://services.nvd.nist.gov/rest/json";

const TYPED_SEARCH_PARAMS: [&str; 7] = [
    "cvssV3Severity",
    "cweId",
    "keywordSearch",
    "pubStartDate",
    "pubEndDate",
    "resultsPerPage",
    "startIndex",
];

/// National Vulnerability Database CVE API 2.0.
///
/// The API key travels in the `apiKey` header. NVD also serves keyless
/// clients at a lower rate limit, so an empty key simply omits the header.
pub struct NvdConnector {
    executor: RequestExecutor,
    api_key: String,
    base_url: String,
    settings: ConnectorSettings,
}

impl NvdConnector {
    pub fn new(api_key: &str, executor: RequestExecutor) -> Self {
        Self {
            executor,
            api_key: api_key.to_string(),
            base_url: NVD_BASE_URL.to_string(),
            settings: ConnectorSettings::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_settings(mut self, settings: ConnectorSettings) -> Self {
        self.settings = settings;
        self
    }

    fn cves_url(&self) -> String {
        format!("{}/cves/2.0", self.base_url)
    }

    fn request(&self) -> RequestSpec {
        let spec = RequestSpec::get(self.cves_url());
        let spec = if self.api_key.is_empty() { spec } else { spec.header("apiKey", &self.api_key) };
        self.settings.apply(spec)
    }

    /// Single CVE lookup with extra query parameters (e.g. `addOns`).
    pub async fn lookup_with(&self, identifier: &str, extra_params: &BTreeMap<String, String>) -> ExecutionResult {
        debug!(identifier, "NVD lookup");
        let spec = self
            .request()
            .query("cveId", identifier)
            .query_map(extra_params.clone());
        self.executor.execute(spec).await
    }

    /// Build the listing query. Extra parameters may not reuse a typed filter
    /// name, otherwise they would slip past `SearchFilters::validate`.
    fn search_query(filters: &SearchFilters) -> Result<BTreeMap<String, String>, VulnmapError> {
        if let Some(key) = filters.extra_params.keys().find(|k| TYPED_SEARCH_PARAMS.contains(&k.as_str())) {
            return Err(VulnmapError::InvalidArgument(format!(
                "'{}' must be set through its search filter, not as an extra parameter",
                key
            )));
        }

        let mut query = BTreeMap::new();
        if let Some(severity) = filters.severity {
            query.insert("cvssV3Severity".to_string(), severity.as_str().to_string());
        }
        let optional = [
            ("cweId", &filters.cwe_id),
            ("keywordSearch", &filters.keyword),
            ("pubStartDate", &filters.published_start),
            ("pubEndDate", &filters.published_end),
        ];
        for (name, value) in optional {
            if let Some(v) = value {
                query.insert(name.to_string(), v.clone());
            }
        }
        if let Some(size) = filters.page_size {
            query.insert("resultsPerPage".to_string(), size.to_string());
        }
        if let Some(index) = filters.start_index {
            query.insert("startIndex".to_string(), index.to_string());
        }
        query.extend(filters.extra_params.clone());
        Ok(query)
    }
}

#[async_trait]
impl VulnerabilitySource for NvdConnector {
    async fn lookup(&self, identifier: &str) -> ExecutionResult {
        self.lookup_with(identifier, &BTreeMap::new()).await
    }

    async fn search(&self, filters: &SearchFilters) -> ExecutionResult {
        let query = match filters.validate().and_then(|()| Self::search_query(filters)) {
            Ok(query) => query,
            Err(e) => return ExecutionResult::from_error(&e),
        };
        let spec = self.request().query_map(query);
        self.executor.execute(spec).await
    }

    async fn test_connection(&self) -> ConnectionCheck {
        self.executor
            .test_connection(self.request().query("resultsPerPage", "1"))
            .await
    }

    fn records<'a>(&self, payload: &'a Value) -> Vec<&'a Value> {
        payload
            .get("vulnerabilities")
            .and_then(|v| v.as_array())
            .map(|entries| entries.iter().filter_map(|e| e.get("cve")).collect())
            .unwrap_or_default()
    }

    fn weaknesses(&self, record: &Value) -> Vec<Value> {
        record
            .get("weaknesses")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default()
    }

    fn provider_name(&self) -> &str { "nvd" }
}
