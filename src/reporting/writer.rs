use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::enrichment::{EnrichmentEvent, EventSink, OutputArtifacts};
use crate::errors::VulnmapError;

/// The four files written for one enriched vulnerability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    TechnicalAnalysis,
    ExecutiveAnalysis,
    TechniqueLayer,
    ThreatGraph,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 4] = [
        Self::TechnicalAnalysis,
        Self::ExecutiveAnalysis,
        Self::TechniqueLayer,
        Self::ThreatGraph,
    ];

    fn suffix(&self) -> &'static str {
        match self {
            Self::TechnicalAnalysis => "Technical_Analysis.md",
            Self::ExecutiveAnalysis => "Executive_Analysis.md",
            Self::TechniqueLayer => "MITRE_ATT&CK_Layer.json",
            Self::ThreatGraph => "STIX_Bundle.json",
        }
    }

    /// Canonical filename for this artifact of `identifier`.
    pub fn filename(&self, identifier: &str) -> String {
        format!("{}_{}", identifier, self.suffix())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenArtifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
}

/// JSON with a four-space indent.
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, VulnmapError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    String::from_utf8(buf).map_err(|e| VulnmapError::Format(format!("Serialized JSON is not UTF-8: {}", e)))
}

/// Write all four artifacts into `dir`, creating it if needed. Contents are
/// rendered before anything touches disk, so a serialization failure leaves
/// no partial output.
pub async fn write_artifacts(dir: &Path, artifacts: &OutputArtifacts) -> Result<Vec<WrittenArtifact>, VulnmapError> {
    let id = artifacts.identifier.as_str();
    let rendered = [
        (ArtifactKind::TechnicalAnalysis, artifacts.technical_report.clone()),
        (ArtifactKind::ExecutiveAnalysis, artifacts.executive_report.clone()),
        (ArtifactKind::TechniqueLayer, to_pretty_json(&artifacts.technique_layer)?),
        (ArtifactKind::ThreatGraph, to_pretty_json(&artifacts.threat_graph)?),
    ];

    tokio::fs::create_dir_all(dir).await?;

    let mut written = Vec::with_capacity(rendered.len());
    for (kind, content) in rendered {
        let path = dir.join(kind.filename(id));
        tokio::fs::write(&path, content).await?;
        written.push(WrittenArtifact { kind, path });
    }

    info!(identifier = id, dir = %dir.display(), "Artifacts written");
    Ok(written)
}

/// Persist the artifacts and close the run's event stream: `Completed` with
/// the four file names once they are on disk, `Failed` otherwise.
pub async fn publish_artifacts(
    dir: &Path,
    artifacts: &OutputArtifacts,
    events: &EventSink,
) -> Result<Vec<WrittenArtifact>, VulnmapError> {
    match write_artifacts(dir, artifacts).await {
        Ok(written) => {
            let files = written
                .iter()
                .map(|w| w.kind.filename(artifacts.identifier.as_str()))
                .collect();
            events.emit(EnrichmentEvent::Completed { identifier: artifacts.identifier.to_string(), files });
            Ok(written)
        }
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Failed to write artifacts");
            events.emit(EnrichmentEvent::Failed { error: e.to_string() });
            Err(e)
        }
    }
}
