pub mod identifier;
pub mod record;
pub mod prompt;
pub mod reply;
pub mod artifacts;
pub mod events;
pub mod orchestrator;

pub use artifacts::{LegendItem, OutputArtifacts, TechniqueLayer};
pub use events::{EnrichmentEvent, EventSink};
pub use identifier::CveId;
pub use orchestrator::{EnrichmentOrchestrator, EnrichmentRequest};
pub use record::VulnerabilityRecord;
pub use reply::{AnalysisReply, TechniqueEntry};
