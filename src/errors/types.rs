use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VulnmapError {
    #[error("Format error: {0}")]
    Format(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Upstream server error (HTTP {status}): {message}")]
    UpstreamServer { status: u16, message: String },

    #[error("Upstream client error{}: {message}", .status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    UpstreamClient { status: Option<u16>, message: String },

    #[error("Contract violation: {0}")]
    ContractViolation(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl VulnmapError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Format(_) => ErrorKind::Format,
            Self::Config(_) | Self::Yaml(_) => ErrorKind::Configuration,
            Self::Transport(_) => ErrorKind::Transport,
            Self::UpstreamServer { .. } => ErrorKind::UpstreamServer,
            Self::UpstreamClient { .. } => ErrorKind::UpstreamClient,
            Self::ContractViolation(_) => ErrorKind::ContractViolation,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Io(_) => ErrorKind::Io,
            Self::Json(_) => ErrorKind::Decode,
        }
    }
}

/// Failure taxonomy shared by `VulnmapError` and error-shaped `ExecutionResult`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Format,
    Configuration,
    InvalidMethod,
    InvalidArgument,
    Transport,
    UpstreamServer,
    UpstreamClient,
    /// Body could not be decoded in the requested form.
    Decode,
    ContractViolation,
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Format => "format",
            Self::Configuration => "configuration",
            Self::InvalidMethod => "invalid_method",
            Self::InvalidArgument => "invalid_argument",
            Self::Transport => "transport",
            Self::UpstreamServer => "upstream_server",
            Self::UpstreamClient => "upstream_client",
            Self::Decode => "decode",
            Self::ContractViolation => "contract_violation",
            Self::Io => "io",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
