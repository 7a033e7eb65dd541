use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::VulnmapError;

static CVE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^CVE-[0-9]{4}-[0-9]{4,}$").unwrap_or_else(|e| unreachable!("invalid CVE pattern: {e}"))
});

/// A syntactically valid CVE identifier (`CVE-YYYY-NNNN…`, case-sensitive).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CveId(String);

impl CveId {
    pub fn parse(raw: &str) -> Result<Self, VulnmapError> {
        if CVE_PATTERN.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(VulnmapError::Format(format!(
                "'{}' is not a valid CVE identifier (expected CVE-YYYY-NNNN)",
                raw
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CveId {
    type Error = VulnmapError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CveId> for String {
    fn from(id: CveId) -> Self {
        id.0
    }
}

impl std::str::FromStr for CveId {
    type Err = VulnmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for CveId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
