use async_trait::async_trait;
use serde_json::{Map, Value};

use super::types::{ChatMessage, SearchFilters};
use crate::http::{ConnectionCheck, ExecutionResult};

/// A vulnerability database reachable over HTTP.
///
/// Implementations also own the provider-specific knowledge of where records
/// and weakness entries live inside their payloads.
#[async_trait]
pub trait VulnerabilitySource: Send + Sync {
    /// Fetch a single record by identifier.
    async fn lookup(&self, identifier: &str) -> ExecutionResult;

    /// Filtered listing. Invalid filter combinations come back as an
    /// error-shaped result without any request being sent.
    async fn search(&self, filters: &SearchFilters) -> ExecutionResult;

    /// Minimal read-only call validating the credential.
    async fn test_connection(&self) -> ConnectionCheck;

    /// Records contained in a lookup/search payload, in provider order.
    fn records<'a>(&self, payload: &'a Value) -> Vec<&'a Value>;

    /// Raw weakness/classification entries of one record.
    fn weaknesses(&self, record: &Value) -> Vec<Value>;

    /// Provider name for logging
    fn provider_name(&self) -> &str;
}

/// A chat-style language model that can be asked for a JSON reply.
#[async_trait]
pub trait AnalysisModel: Send + Sync {
    /// Chat completion demanding a structured (JSON object) reply.
    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        extra_parameters: Option<&Map<String, Value>>,
    ) -> ExecutionResult;

    async fn test_connection(&self) -> ConnectionCheck;

    /// Text content of the first choice in a chat payload.
    fn reply_content(&self, payload: &Value) -> Option<String>;

    fn provider_name(&self) -> &str;
}
