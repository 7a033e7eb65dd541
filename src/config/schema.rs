use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "source": {
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "provider": { "type": "string", "enum": ["nvd"] },
                    "api_key": { "type": "string" },
                    "base_url": { "type": "string", "format": "uri" }
                }
            },
            "analysis": {
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "provider": { "type": "string", "enum": ["openai"] },
                    "model": { "type": "string", "minLength": 1 },
                    "api_key": { "type": "string" },
                    "base_url": { "type": "string", "format": "uri" },
                    "timeout_secs": { "type": "integer", "minimum": 1 }
                }
            },
            "http": {
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "timeout_secs": { "type": "integer", "minimum": 1 },
                    "retry_count": { "type": "integer", "minimum": 0, "maximum": 10 },
                    "retry_backoff_secs": { "type": "integer", "minimum": 0, "maximum": 60 },
                    "verify_tls": { "type": "boolean" },
                    "proxy": { "type": "string" }
                }
            },
            "output": {
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "directory": { "type": "string" }
                }
            }
        }
    })
});
