use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::debug;

use super::provider::AnalysisModel;
use super::types::{ChatMessage, ConnectorSettings};
use crate::http::constants::CHAT_TIMEOUT_SECS;
use crate::http::{ConnectionCheck, ExecutionResult, RequestExecutor, RequestSpec};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiConnector {
    executor: RequestExecutor,
    api_key: String,
    base_url: String,
    settings: ConnectorSettings,
}

impl OpenAiConnector {
    pub fn new(api_key: &str, executor: RequestExecutor) -> Self {
        Self {
            executor,
            api_key: api_key.to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
            settings: ConnectorSettings::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_settings(mut self, settings: ConnectorSettings) -> Self {
        self.settings = settings;
        self
    }

    fn request(&self, method: &str, path: &str) -> RequestSpec {
        RequestSpec::new(method, format!("{}/{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
    }

    pub async fn list_models(&self) -> ExecutionResult {
        self.executor.execute(self.settings.apply(self.request("GET", "models"))).await
    }

    pub async fn model_details(&self, model: &str) -> ExecutionResult {
        self.executor
            .execute(self.settings.apply(self.request("GET", &format!("models/{}", model))))
            .await
    }

    fn chat_body(model: &str, messages: &[ChatMessage], extra: Option<&Map<String, Value>>) -> Value {
        let mut body = Map::new();
        body.insert("model".into(), json!(model));
        body.insert("messages".into(), json!(messages));
        body.insert("response_format".into(), json!({"type": "json_object"}));
        if let Some(extra) = extra {
            for (key, value) in extra {
                body.insert(key.clone(), value.clone());
            }
        }
        Value::Object(body)
    }
}

#[async_trait]
impl AnalysisModel for OpenAiConnector {
    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        extra_parameters: Option<&Map<String, Value>>,
    ) -> ExecutionResult {
        debug!(model, messages = messages.len(), "OpenAI chat completion");
        let spec = self
            .request("POST", "chat/completions")
            .timeout_secs(self.settings.chat_timeout_secs.unwrap_or(CHAT_TIMEOUT_SECS))
            .json(Self::chat_body(model, messages, extra_parameters));
        self.executor.execute(self.settings.apply(spec)).await
    }

    async fn test_connection(&self) -> ConnectionCheck {
        self.executor
            .test_connection(self.settings.apply(self.request("GET", "models")))
            .await
    }

    fn reply_content(&self, payload: &Value) -> Option<String> {
        payload
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    fn provider_name(&self) -> &str { "openai" }
}
