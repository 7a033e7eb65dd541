use serde::Serialize;
use serde_json::Value;

use super::identifier::CveId;

/// One vulnerability as seen by a single pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VulnerabilityRecord {
    pub identifier: CveId,
    /// Raw weakness/classification entries; may be empty.
    pub weaknesses: Vec<Value>,
    /// Provider payload for prompt context, `Null` when nothing matched.
    pub raw: Value,
}

impl VulnerabilityRecord {
    pub fn new(identifier: CveId, weaknesses: Vec<Value>, raw: Value) -> Self {
        Self { identifier, weaknesses, raw }
    }

    /// Stand-in used when the source returned no matching record.
    pub fn placeholder(identifier: CveId) -> Self {
        Self { identifier, weaknesses: Vec::new(), raw: Value::Null }
    }

    pub fn is_placeholder(&self) -> bool {
        self.raw.is_null()
    }

    /// Weakness IDs such as `CWE-502`, pulled from NVD-style
    /// `description[].value` entries or plain strings.
    pub fn weakness_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for entry in &self.weaknesses {
            let candidates: Vec<&str> = match entry {
                Value::String(s) => vec![s.as_str()],
                Value::Object(_) => entry
                    .get("description")
                    .and_then(|d| d.as_array())
                    .map(|items| items.iter().filter_map(|d| d.get("value")?.as_str()).collect())
                    .unwrap_or_default(),
                _ => Vec::new(),
            };
            for id in candidates {
                if !ids.iter().any(|seen| seen == id) {
                    ids.push(id.to_string());
                }
            }
        }
        ids
    }
}
