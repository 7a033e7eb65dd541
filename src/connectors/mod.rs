pub mod provider;
pub mod types;
pub mod nvd;
pub mod openai;
pub mod router;
pub mod catalog;

pub use provider::{AnalysisModel, VulnerabilitySource};
pub use router::{create_analysis, create_source, AnalysisProvider, SourceProvider};
pub use types::{ChatMessage, ConnectorSettings, SearchFilters, Severity};
