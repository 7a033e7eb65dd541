use serde_json::Value;

use super::record::VulnerabilityRecord;
use crate::connectors::ChatMessage;

const SYSTEM_TEMPLATE: &str = "You are a cyber security analyst with deep knowledge of MITRE ATT&CK, \
MITRE D3FEND and STIX 2.1.

Your task is to map a vulnerability to the attack techniques an adversary would use against it \
and the defensive measures that counter them.

Respond ONLY with a single JSON object in the structure the user defines. Do not add keys, \
do not omit keys and do not wrap the object in prose or code fences.";

const USER_TEMPLATE: &str = "Map the following vulnerability to MITRE ATT&CK techniques and D3FEND countermeasures.

```
CVE ID: {{IDENTIFIER}}
Weaknesses: {{WEAKNESSES}}
Vulnerability record: {{RECORD}}
Additional context: {{EXTRA_CONTEXT}}
```

Return a JSON object with exactly these four keys:

{
  \"techniques\": [
    {
      \"techniqueID\": \"ATT&CK technique ID, e.g. T1190 or T1059.004\",
      \"comment\": \"{{IDENTIFIER}} - why the technique applies and how to defend against it\",
      \"color\": \"#ff6666\"
    }
  ],
  \"technical_analysis\": \"Markdown report for a technical audience: affected components, root cause, related techniques, exploitation impact, detection and mitigation procedures, each in its own section.\",
  \"executive_analysis\": \"Markdown report for a non-technical executive audience: what is affected, business risk and impact, and the recommended response.\",
  \"stix_bundle\": \"A STIX 2.1 bundle object (not a string) with type 'bundle' and an 'objects' array.\"
}

Rules for stix_bundle:
- Exactly one object of type 'vulnerability' representing {{IDENTIFIER}}; it is the primary node.
- Every attack-pattern, course-of-action and note is its own object.
- Every object other than the vulnerability must be linked by a 'relationship' object whose \
'relationship_type' names the link (e.g. 'targets', 'mitigates', 'related-to'); there must be no unconnected nodes.
- Every relationship's source_ref and target_ref must reference an object id present in the bundle.
- Courses of action are linked to the technique they mitigate; defensive guidance is added as notes.";

const NO_RECORD: &str = "No record returned by the vulnerability source";

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

/// Values substituted into the prompt templates.
#[derive(Debug, Clone, Default)]
pub struct PromptVariables {
    pub identifier: String,
    pub weaknesses: String,
    pub record: String,
    pub extra_context: Option<String>,
}

impl PromptVariables {
    pub fn from_record(record: &VulnerabilityRecord, extra_context: Option<&Value>) -> Self {
        Self {
            identifier: record.identifier.to_string(),
            weaknesses: join_or_none(&record.weakness_ids()),
            record: if record.is_placeholder() {
                NO_RECORD.to_string()
            } else {
                record.raw.to_string()
            },
            extra_context: extra_context.map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
        }
    }
}

/// Replace `{{VARIABLE}}` placeholders. A missing optional value becomes "None".
pub fn interpolate(template: &str, vars: &PromptVariables) -> String {
    template
        .replace("{{IDENTIFIER}}", &vars.identifier)
        .replace("{{WEAKNESSES}}", &vars.weaknesses)
        .replace("{{RECORD}}", &vars.record)
        .replace("{{EXTRA_CONTEXT}}", vars.extra_context.as_deref().unwrap_or("None"))
}

/// The two-message conversation sent to the analysis model: role and
/// output obligation first, then the vulnerability material and schema.
pub fn build_messages(record: &VulnerabilityRecord, extra_context: Option<&Value>) -> Vec<ChatMessage> {
    let vars = PromptVariables::from_record(record, extra_context);
    vec![
        ChatMessage::system(SYSTEM_TEMPLATE),
        ChatMessage::user(&interpolate(USER_TEMPLATE, &vars)),
    ]
}
