use std::str::FromStr;

use super::catalog;
use super::nvd::NvdConnector;
use super::openai::OpenAiConnector;
use super::provider::{AnalysisModel, VulnerabilitySource};
use super::types::ConnectorSettings;
use crate::errors::VulnmapError;
use crate::http::RequestExecutor;

/// Vulnerability databases the pipeline can read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceProvider {
    #[default]
    Nvd,
}

impl SourceProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nvd => "nvd",
        }
    }

    pub fn info(&self) -> Option<&'static catalog::ProviderInfo> {
        catalog::get_provider(self.as_str())
    }
}

impl FromStr for SourceProvider {
    type Err = VulnmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nvd" => Ok(Self::Nvd),
            other => Err(VulnmapError::Config(format!("Unknown vulnerability source: {}", other))),
        }
    }
}

impl std::fmt::Display for SourceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisProvider {
    #[default]
    OpenAi,
}

impl AnalysisProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
        }
    }

    pub fn info(&self) -> Option<&'static catalog::ProviderInfo> {
        catalog::get_provider(self.as_str())
    }
}

impl FromStr for AnalysisProvider {
    type Err = VulnmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            other => Err(VulnmapError::Config(format!("Unknown analysis provider: {}", other))),
        }
    }
}

impl std::fmt::Display for AnalysisProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn create_source(
    provider: SourceProvider,
    api_key: &str,
    executor: RequestExecutor,
    base_url: Option<&str>,
    settings: ConnectorSettings,
) -> Box<dyn VulnerabilitySource> {
    match provider {
        SourceProvider::Nvd => {
            let connector = NvdConnector::new(api_key, executor).with_settings(settings);
            match base_url {
                Some(url) => Box::new(connector.with_base_url(url)),
                None => Box::new(connector),
            }
        }
    }
}

pub fn create_analysis(
    provider: AnalysisProvider,
    api_key: &str,
    executor: RequestExecutor,
    base_url: Option<&str>,
    settings: ConnectorSettings,
) -> Box<dyn AnalysisModel> {
    match provider {
        AnalysisProvider::OpenAi => {
            let connector = OpenAiConnector::new(api_key, executor).with_settings(settings);
            match base_url {
                Some(url) => Box::new(connector.with_base_url(url)),
                None => Box::new(connector),
            }
        }
    }
}
