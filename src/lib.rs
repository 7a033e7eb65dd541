//! CVE enrichment: look a vulnerability up in a public database, ask a
//! language model to map it onto ATT&CK techniques, and emit a technical
//! report, an executive report, a Navigator layer and a STIX 2.1 bundle.

pub mod config;
pub mod connectors;
pub mod enrichment;
pub mod errors;
pub mod http;
pub mod reporting;

#[cfg(feature = "cli")]
pub mod cli;

pub use connectors::{AnalysisModel, VulnerabilitySource};
pub use enrichment::{EnrichmentOrchestrator, EnrichmentRequest, EventSink, OutputArtifacts};
pub use errors::VulnmapError;
pub use http::{ExecutionResult, RequestExecutor, RequestSpec};
