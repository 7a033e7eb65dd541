use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::VulnmapError;

static TECHNIQUE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^T[0-9]{4}(\.[0-9]{3})?$").unwrap_or_else(|e| unreachable!("invalid technique pattern: {e}"))
});

pub static REPLY_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "required": ["techniques", "technical_analysis", "executive_analysis", "stix_bundle"],
        "additionalProperties": false,
        "properties": {
            "techniques": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["techniqueID", "comment", "color"],
                    "additionalProperties": false,
                    "properties": {
                        "techniqueID": { "type": "string" },
                        "comment": { "type": "string" },
                        "color": { "type": "string" }
                    }
                }
            },
            "technical_analysis": { "type": "string", "minLength": 1 },
            "executive_analysis": { "type": "string", "minLength": 1 },
            "stix_bundle": {
                "type": "object",
                "required": ["type", "objects"],
                "properties": {
                    "type": { "const": "bundle" },
                    "objects": { "type": "array" }
                }
            }
        }
    })
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TechniqueEntry {
    #[serde(rename = "techniqueID")]
    pub technique_id: String,
    pub comment: String,
    pub color: String,
}

/// The structured reply demanded from the analysis model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisReply {
    pub techniques: Vec<TechniqueEntry>,
    pub technical_analysis: String,
    pub executive_analysis: String,
    pub stix_bundle: Value,
}

impl AnalysisReply {
    /// Parse and fully validate the model's content string. Any deviation
    /// from the expected shape fails the whole reply.
    pub fn parse(content: &str) -> Result<Self, VulnmapError> {
        let value: Value = serde_json::from_str(content).map_err(|e| {
            VulnmapError::ContractViolation(format!("Model reply is not valid JSON: {}", e))
        })?;
        validate_schema(&value)?;
        let reply: AnalysisReply = serde_json::from_value(value).map_err(|e| {
            VulnmapError::ContractViolation(format!("Model reply has an unexpected shape: {}", e))
        })?;
        reply.validate()?;
        Ok(reply)
    }

    pub fn validate(&self) -> Result<(), VulnmapError> {
        if self.technical_analysis.trim().is_empty() {
            return Err(violation("technical_analysis is empty"));
        }
        if self.executive_analysis.trim().is_empty() {
            return Err(violation("executive_analysis is empty"));
        }
        for technique in &self.techniques {
            if !TECHNIQUE_ID.is_match(&technique.technique_id) {
                return Err(violation(&format!(
                    "'{}' is not a valid ATT&CK technique ID",
                    technique.technique_id
                )));
            }
        }
        validate_bundle(&self.stix_bundle)
    }
}

fn violation(message: &str) -> VulnmapError {
    VulnmapError::ContractViolation(message.to_string())
}

fn validate_schema(value: &Value) -> Result<(), VulnmapError> {
    let compiled = jsonschema::JSONSchema::compile(&REPLY_SCHEMA)
        .map_err(|e| VulnmapError::Config(format!("Reply schema compilation error: {}", e)))?;

    if let Err(errors) = compiled.validate(value) {
        let messages: Vec<String> = errors
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() { e.to_string() } else { format!("{} at {}", e, path) }
            })
            .collect();
        return Err(VulnmapError::ContractViolation(format!(
            "Model reply failed schema validation: {}",
            messages.join("; ")
        )));
    }
    Ok(())
}

/// Structural checks on the threat graph: one primary vulnerability node,
/// labeled relationships with resolvable ends, and every node reachable from
/// the vulnerability.
pub fn validate_bundle(bundle: &Value) -> Result<(), VulnmapError> {
    if bundle.get("type").and_then(|t| t.as_str()) != Some("bundle") {
        return Err(violation("stix_bundle must be an object of type 'bundle'"));
    }
    let objects = bundle
        .get("objects")
        .and_then(|o| o.as_array())
        .ok_or_else(|| violation("stix_bundle has no 'objects' array"))?;

    let mut ids: HashSet<&str> = HashSet::new();
    let mut nodes: Vec<(&str, &str)> = Vec::new();
    let mut relationships: Vec<&Value> = Vec::new();

    for object in objects {
        let kind = object
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| violation("stix_bundle object without a 'type'"))?;
        let id = object
            .get("id")
            .and_then(|i| i.as_str())
            .ok_or_else(|| violation(&format!("stix_bundle '{}' object without an 'id'", kind)))?;
        if !ids.insert(id) {
            return Err(violation(&format!("duplicate object id '{}'", id)));
        }
        if kind == "relationship" {
            relationships.push(object);
        } else {
            nodes.push((kind, id));
        }
    }

    let vulnerabilities = nodes.iter().filter(|(kind, _)| *kind == "vulnerability").count();
    if vulnerabilities != 1 {
        return Err(violation(&format!(
            "stix_bundle must contain exactly one vulnerability object, found {}",
            vulnerabilities
        )));
    }

    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for rel in relationships {
        let label = rel.get("relationship_type").and_then(|t| t.as_str()).unwrap_or("");
        if label.trim().is_empty() {
            return Err(violation("relationship without a relationship_type"));
        }
        let mut ends = [""; 2];
        for (slot, end) in ends.iter_mut().zip(["source_ref", "target_ref"]) {
            let target = rel
                .get(end)
                .and_then(|r| r.as_str())
                .ok_or_else(|| violation(&format!("'{}' relationship missing {}", label, end)))?;
            if !ids.contains(target) {
                return Err(violation(&format!(
                    "'{}' relationship references unknown object '{}'",
                    label, target
                )));
            }
            *slot = target;
        }
        let [source, target] = ends;
        adjacency.entry(source).or_default().push(target);
        adjacency.entry(target).or_default().push(source);
    }

    // Every node must be reachable from the vulnerability, edges undirected.
    let root = nodes
        .iter()
        .find(|(kind, _)| *kind == "vulnerability")
        .map(|(_, id)| *id)
        .ok_or_else(|| violation("stix_bundle has no vulnerability object"))?;
    let mut reached: HashSet<&str> = HashSet::from([root]);
    let mut queue: VecDeque<&str> = VecDeque::from([root]);
    while let Some(current) = queue.pop_front() {
        for next in adjacency.get(current).into_iter().flatten() {
            if reached.insert(*next) {
                queue.push_back(*next);
            }
        }
    }

    if let Some((kind, id)) = nodes
        .iter()
        .find(|(_, id)| !reached.contains(id))
    {
        return Err(violation(&format!("unconnected {} node '{}'", kind, id)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> Value {
        json!({
            "type": "bundle",
            "id": "bundle--1",
            "objects": [
                {"type": "vulnerability", "id": "vulnerability--1", "name": "CVE-2021-44228"},
                {"type": "attack-pattern", "id": "attack-pattern--1", "name": "Exploit Public-Facing Application"},
                {"type": "relationship", "id": "relationship--1", "relationship_type": "targets",
                 "source_ref": "attack-pattern--1", "target_ref": "vulnerability--1"}
            ]
        })
    }

    fn reply() -> Value {
        json!({
            "techniques": [{"techniqueID": "T1190", "comment": "JNDI lookup via logged input", "color": "#ff6666"}],
            "technical_analysis": "# Technical\nRemote code execution.",
            "executive_analysis": "# Executive\nPatch now.",
            "stix_bundle": bundle()
        })
    }

    #[test]
    fn test_valid_reply_parses() {
        let parsed = AnalysisReply::parse(&reply().to_string()).unwrap();
        assert_eq!(parsed.techniques[0].technique_id, "T1190");
        assert_eq!(parsed.stix_bundle, bundle());
    }

    #[test]
    fn test_missing_key_rejected() {
        let mut value = reply();
        value.as_object_mut().unwrap().remove("executive_analysis");
        let err = AnalysisReply::parse(&value.to_string()).unwrap_err();
        assert!(matches!(err, VulnmapError::ContractViolation(_)));
    }

    #[test]
    fn test_extra_key_rejected() {
        let mut value = reply();
        value["confidence"] = json!("high");
        assert!(matches!(AnalysisReply::parse(&value.to_string()), Err(VulnmapError::ContractViolation(_))));

        let mut value = reply();
        value["techniques"][0]["score"] = json!(3);
        assert!(AnalysisReply::parse(&value.to_string()).is_err());
    }

    #[test]
    fn test_non_json_rejected() {
        let err = AnalysisReply::parse("Sure! Here is the analysis:").unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn test_string_encoded_bundle_rejected() {
        let mut value = reply();
        value["stix_bundle"] = json!(bundle().to_string());
        assert!(AnalysisReply::parse(&value.to_string()).is_err());
    }

    #[test]
    fn test_technique_id_format() {
        for good in ["T1190", "T1059.004"] {
            let mut value = reply();
            value["techniques"][0]["techniqueID"] = json!(good);
            assert!(AnalysisReply::parse(&value.to_string()).is_ok(), "{good} rejected");
        }
        for bad in ["1190", "T119", "t1190", "T1059.4", "D3-NTA", "T١١٩٠", "T1059.००४"] {
            let mut value = reply();
            value["techniques"][0]["techniqueID"] = json!(bad);
            assert!(AnalysisReply::parse(&value.to_string()).is_err(), "{bad} accepted");
        }
    }

    #[test]
    fn test_blank_report_rejected() {
        let mut value = reply();
        value["technical_analysis"] = json!("   ");
        assert!(AnalysisReply::parse(&value.to_string()).is_err());
    }

    #[test]
    fn test_unconnected_node_rejected() {
        let mut value = bundle();
        value["objects"].as_array_mut().unwrap().push(json!({"type": "note", "id": "note--1", "content": "orphan"}));
        let err = validate_bundle(&value).unwrap_err();
        assert!(err.to_string().contains("note--1"));
    }

    #[test]
    fn test_island_detached_from_vulnerability_rejected() {
        let mut value = bundle();
        let objects = value["objects"].as_array_mut().unwrap();
        objects.push(json!({"type": "attack-pattern", "id": "attack-pattern--2", "name": "Command and Scripting Interpreter"}));
        objects.push(json!({"type": "note", "id": "note--2", "content": "linked only to the technique"}));
        objects.push(json!({"type": "relationship", "id": "relationship--2", "relationship_type": "related-to",
                            "source_ref": "note--2", "target_ref": "attack-pattern--2"}));
        let err = validate_bundle(&value).unwrap_err();
        assert!(matches!(err, VulnmapError::ContractViolation(_)));
        assert!(err.to_string().contains("unconnected"));
    }

    #[test]
    fn test_chain_through_intermediate_node_is_valid() {
        let mut value = bundle();
        let objects = value["objects"].as_array_mut().unwrap();
        objects.push(json!({"type": "course-of-action", "id": "course-of-action--1", "name": "Upgrade log4j"}));
        objects.push(json!({"type": "relationship", "id": "relationship--2", "relationship_type": "mitigates",
                            "source_ref": "course-of-action--1", "target_ref": "attack-pattern--1"}));
        assert!(validate_bundle(&value).is_ok());
    }

    #[test]
    fn test_dangling_relationship_rejected() {
        let mut value = bundle();
        value["objects"][2]["target_ref"] = json!("vulnerability--404");
        assert!(validate_bundle(&value).is_err());
    }

    #[test]
    fn test_unlabeled_relationship_rejected() {
        let mut value = bundle();
        value["objects"][2]["relationship_type"] = json!("");
        assert!(validate_bundle(&value).is_err());
    }

    #[test]
    fn test_primary_node_must_be_unique() {
        let mut value = bundle();
        value["objects"].as_array_mut().unwrap().push(json!({"type": "vulnerability", "id": "vulnerability--2"}));
        assert!(validate_bundle(&value).is_err());

        let none = json!({"type": "bundle", "objects": []});
        assert!(validate_bundle(&none).is_err());
    }

    #[test]
    fn test_lone_vulnerability_is_valid() {
        let value = json!({"type": "bundle", "objects": [{"type": "vulnerability", "id": "vulnerability--1"}]});
        assert!(validate_bundle(&value).is_ok());
    }
}
