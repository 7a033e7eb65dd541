use std::path::Path;

use super::schema::CONFIG_SCHEMA;
use super::types::VulnmapConfig;
use crate::connectors::{AnalysisProvider, SourceProvider};
use crate::errors::{RetryPolicy, VulnmapError};
use tracing::warn;

const MAX_CONFIG_BYTES: u64 = 1_048_576;

pub async fn parse_config(path: &Path) -> Result<VulnmapConfig, VulnmapError> {
    if !path.exists() {
        return Err(VulnmapError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > MAX_CONFIG_BYTES {
        return Err(VulnmapError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    parse_config_str(&content)
}

/// Config from `path`, or the empty default when no file was given.
pub async fn load_config(path: Option<&Path>) -> Result<VulnmapConfig, VulnmapError> {
    match path {
        Some(path) => parse_config(path).await,
        None => Ok(VulnmapConfig::default()),
    }
}

pub fn parse_config_str(content: &str) -> Result<VulnmapConfig, VulnmapError> {
    // An empty file is a valid, empty config.
    if content.trim().is_empty() {
        return Ok(VulnmapConfig::default());
    }
    let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;

    for msg in schema_warnings(&yaml)? {
        warn!(validation_error = %msg, "Config schema warning");
    }

    let config: VulnmapConfig = serde_yaml::from_value(yaml)?;
    validate_config(&config)?;
    Ok(config)
}

/// Structural problems reported by the JSON schema. Advisory only.
pub fn schema_warnings(yaml: &serde_yaml::Value) -> Result<Vec<String>, VulnmapError> {
    let json_value = serde_json::to_value(yaml)
        .map_err(|e| VulnmapError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| VulnmapError::Config(format!("Schema compilation error: {}", e)))?;

    let messages = match compiled.validate(&json_value) {
        Ok(()) => Vec::new(),
        Err(errors) => errors.map(|e| format!("{} at {}", e, e.instance_path)).collect(),
    };
    Ok(messages)
}

/// Semantic checks that must hold before any request is built.
pub fn validate_config(config: &VulnmapConfig) -> Result<(), VulnmapError> {
    config.source_provider().parse::<SourceProvider>()?;
    config.analysis_provider().parse::<AnalysisProvider>()?;

    if let Some(http) = &config.http {
        RetryPolicy::from_settings(http.retry_count, http.retry_backoff_secs)?;
        if http.timeout_secs == Some(0) {
            return Err(VulnmapError::Config("http.timeout_secs must be greater than 0".into()));
        }
        if http.verify_tls == Some(false) {
            warn!("TLS certificate verification is disabled");
        }
    }

    if let Some(analysis) = &config.analysis {
        if analysis.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            return Err(VulnmapError::Config("analysis.model must not be empty".into()));
        }
        if analysis.timeout_secs == Some(0) {
            return Err(VulnmapError::Config("analysis.timeout_secs must be greater than 0".into()));
        }
    }

    let urls = [
        ("source.base_url", config.source_base_url()),
        ("analysis.base_url", config.analysis_base_url()),
        ("http.proxy", config.proxy().map(|s| s.to_string())),
    ];
    for (field, url) in urls {
        if let Some(url) = url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(VulnmapError::Config(format!(
                    "{} must start with http:// or https://, got '{}'",
                    field, url
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FULL: &str = r#"
source:
  provider: nvd
  api_key: $NVD_API_KEY
analysis:
  provider: openai
  model: gpt-4o
  timeout_secs: 900
http:
  timeout_secs: 30
  retry_count: 3
  retry_backoff_secs: 10
  verify_tls: true
output:
  directory: ./reports
"#;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config_str(FULL).unwrap();
        assert_eq!(config.source_provider(), "nvd");
        assert_eq!(config.model(None), "gpt-4o");
        let http = config.http.unwrap();
        assert_eq!(http.retry_count, Some(3));
        assert_eq!(http.retry_backoff_secs, Some(10));
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(parse_config_str("").unwrap(), VulnmapConfig::default());
    }

    #[test]
    fn test_retry_bounds_are_hard_errors() {
        let err = parse_config_str("http:\n  retry_count: 11\n").unwrap_err();
        assert!(matches!(err, VulnmapError::Config(_)));
        assert!(parse_config_str("http:\n  retry_backoff_secs: 61\n").is_err());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let err = parse_config_str("source:\n  provider: vulndb\n").unwrap_err();
        assert!(err.to_string().contains("vulndb"));
    }

    #[test]
    fn test_bad_base_url_rejected() {
        assert!(parse_config_str("analysis:\n  base_url: ftp://models.internal\n").is_err());
        assert!(parse_config_str("analysis:\n  base_url: https://models.internal/v1\n").is_ok());
    }

    #[test]
    fn test_empty_model_rejected() {
        assert!(parse_config_str("analysis:\n  model: \"  \"\n").is_err());
    }

    #[test]
    fn test_schema_warnings_are_advisory() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("extra_section: true\n").unwrap();
        let warnings = schema_warnings(&yaml).unwrap();
        assert!(!warnings.is_empty());
        // Unknown sections are ignored by the typed config.
        assert!(parse_config_str("extra_section: true\n").is_ok());
    }

    #[tokio::test]
    async fn test_parse_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();
        let config = parse_config(file.path()).await.unwrap();
        assert_eq!(config.output_directory(None), std::path::PathBuf::from("./reports"));
    }

    #[tokio::test]
    async fn test_missing_file_rejected() {
        let err = parse_config(Path::new("/nonexistent/vulnmap.yaml")).await.unwrap_err();
        assert!(matches!(err, VulnmapError::Config(_)));
    }
}
