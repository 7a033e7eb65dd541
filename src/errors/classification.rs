use super::types::VulnmapError;

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    pub retryable: bool,
}

impl VulnmapError {
    /// Classify this error to determine its type and whether it can be retried.
    ///
    /// Only server-side upstream failures are retryable, and only inside the
    /// request executor. Everything else terminates the run.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            VulnmapError::UpstreamServer { .. } => ErrorClassification {
                error_type: "UpstreamServerError",
                retryable: true,
            },

            VulnmapError::Transport(_) => ErrorClassification {
                error_type: "TransportError",
                retryable: false,
            },
            VulnmapError::UpstreamClient { .. } => ErrorClassification {
                error_type: "UpstreamClientError",
                retryable: false,
            },
            VulnmapError::Format(_) => ErrorClassification {
                error_type: "FormatError",
                retryable: false,
            },
            VulnmapError::Config(_) => ErrorClassification {
                error_type: "ConfigurationError",
                retryable: false,
            },
            VulnmapError::ContractViolation(_) => ErrorClassification {
                error_type: "ContractViolation",
                retryable: false,
            },
            VulnmapError::InvalidArgument(_) => ErrorClassification {
                error_type: "InvalidArgumentError",
                retryable: false,
            },
            VulnmapError::Io(_) => ErrorClassification {
                error_type: "IoError",
                retryable: false,
            },
            VulnmapError::Json(_) => ErrorClassification {
                error_type: "JsonError",
                retryable: false,
            },
            VulnmapError::Yaml(_) => ErrorClassification {
                error_type: "YamlError",
                retryable: false,
            },
        }
    }
}
