use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::identifier::CveId;
use super::reply::{AnalysisReply, TechniqueEntry};

pub const LAYER_VERSION: &str = "3.0";
pub const LAYER_DOMAIN: &str = "mitre-enterprise";
pub const LEGEND_LABEL: &str = "CVE ID Information";
pub const LEGEND_COLOR: &str = "#ff6666";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendItem {
    pub label: String,
    pub color: String,
}

/// ATT&CK Navigator layer listing the techniques of one vulnerability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechniqueLayer {
    pub name: String,
    pub version: String,
    pub description: String,
    pub domain: String,
    pub techniques: Vec<TechniqueEntry>,
    #[serde(rename = "legendItems")]
    pub legend_items: Vec<LegendItem>,
}

impl TechniqueLayer {
    pub fn new(identifier: &CveId, techniques: Vec<TechniqueEntry>) -> Self {
        Self {
            name: format!("*{}", identifier),
            version: LAYER_VERSION.to_string(),
            description: format!(
                "MITRE ATT&CK layer describing attack and defense strategies of CVE ID - {}",
                identifier
            ),
            domain: LAYER_DOMAIN.to_string(),
            techniques,
            legend_items: vec![LegendItem {
                label: LEGEND_LABEL.to_string(),
                color: LEGEND_COLOR.to_string(),
            }],
        }
    }
}

/// The four documents produced by a successful run. Always complete.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputArtifacts {
    pub identifier: CveId,
    pub technical_report: String,
    pub executive_report: String,
    pub technique_layer: TechniqueLayer,
    pub threat_graph: Value,
}

impl OutputArtifacts {
    pub fn assemble(identifier: &CveId, reply: AnalysisReply) -> Self {
        Self {
            identifier: identifier.clone(),
            technical_report: reply.technical_analysis,
            executive_report: reply.executive_analysis,
            technique_layer: TechniqueLayer::new(identifier, reply.techniques),
            threat_graph: reply.stix_bundle,
        }
    }
}
