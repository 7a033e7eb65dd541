use serde_json::{Map, Value};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::artifacts::OutputArtifacts;
use super::events::{EnrichmentEvent, EventSink};
use super::identifier::CveId;
use super::prompt::build_messages;
use super::record::VulnerabilityRecord;
use super::reply::AnalysisReply;
use crate::connectors::catalog;
use crate::connectors::{
    create_analysis, create_source, AnalysisModel, AnalysisProvider, ConnectorSettings, SourceProvider,
    VulnerabilitySource,
};
use crate::errors::VulnmapError;
use crate::http::{Payload, RequestExecutor};

/// Inputs of one enrichment run. Credentials travel with the request, never
/// with the orchestrator.
#[derive(Debug, Clone)]
pub struct EnrichmentRequest {
    pub identifier: String,
    pub source_api_key: String,
    pub model_api_key: String,
    /// Vulnerability source selector, e.g. `nvd`.
    pub provider: String,
    pub analysis_provider: String,
    pub model: String,
    pub extra_context: Option<Value>,
}

impl EnrichmentRequest {
    pub fn new(identifier: &str, source_api_key: &str, model_api_key: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            source_api_key: source_api_key.to_string(),
            model_api_key: model_api_key.to_string(),
            provider: SourceProvider::default().to_string(),
            analysis_provider: AnalysisProvider::default().to_string(),
            model: catalog::default_model(AnalysisProvider::default().as_str()).to_string(),
            extra_context: None,
        }
    }

    pub fn with_provider(mut self, provider: &str) -> Self {
        self.provider = provider.to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.extra_context = Some(context);
        self
    }
}

/// Runs the lookup → prompt → analysis → validation → assembly pipeline.
///
/// Holds no per-run state, so one orchestrator can serve concurrent runs.
#[derive(Clone)]
pub struct EnrichmentOrchestrator {
    executor: RequestExecutor,
    settings: ConnectorSettings,
    source_base_url: Option<String>,
    analysis_base_url: Option<String>,
    chat_parameters: Option<Map<String, Value>>,
}

impl EnrichmentOrchestrator {
    pub fn new(executor: RequestExecutor) -> Self {
        Self {
            executor,
            settings: ConnectorSettings::default(),
            source_base_url: None,
            analysis_base_url: None,
            chat_parameters: None,
        }
    }

    pub fn with_settings(mut self, settings: ConnectorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_source_base_url(mut self, url: Option<String>) -> Self {
        self.source_base_url = url;
        self
    }

    pub fn with_analysis_base_url(mut self, url: Option<String>) -> Self {
        self.analysis_base_url = url;
        self
    }

    /// Extra body fields for the chat call, e.g. `temperature`.
    pub fn with_chat_parameters(mut self, params: Map<String, Value>) -> Self {
        self.chat_parameters = Some(params);
        self
    }

    pub async fn run(&self, request: &EnrichmentRequest, events: &EventSink) -> Result<OutputArtifacts, VulnmapError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("enrichment", %run_id, identifier = %request.identifier);

        events.emit(EnrichmentEvent::Initializing);
        let result = self.run_stages(request, events).instrument(span.clone()).await;

        span.in_scope(|| match &result {
            Ok(artifacts) => {
                info!(techniques = artifacts.technique_layer.techniques.len(), "Enrichment completed");
                events.emit(EnrichmentEvent::Analyzed { identifier: artifacts.identifier.to_string() });
            }
            Err(e) => {
                warn!(error = %e, "Enrichment failed");
                events.emit(EnrichmentEvent::Failed { error: e.to_string() });
            }
        });
        result
    }

    async fn run_stages(&self, request: &EnrichmentRequest, events: &EventSink) -> Result<OutputArtifacts, VulnmapError> {
        let identifier = CveId::parse(&request.identifier)?;
        let provider: SourceProvider = request.provider.parse()?;
        let analysis_provider: AnalysisProvider = request.analysis_provider.parse()?;
        if request.model.trim().is_empty() {
            return Err(VulnmapError::Config("Analysis model name must not be empty".into()));
        }

        let source = create_source(
            provider,
            &request.source_api_key,
            self.executor.clone(),
            self.source_base_url.as_deref(),
            self.settings.clone(),
        );
        let model = create_analysis(
            analysis_provider,
            &request.model_api_key,
            self.executor.clone(),
            self.analysis_base_url.as_deref(),
            self.settings.clone(),
        );

        events.processing("lookup");
        let record = self.lookup(source.as_ref(), &identifier).await?;

        events.processing("analysis");
        let messages = build_messages(&record, request.extra_context.as_ref());
        let reply = self.analyze(model.as_ref(), &request.model, &messages).await?;

        events.processing("assembly");
        Ok(OutputArtifacts::assemble(&identifier, reply))
    }

    async fn lookup(&self, source: &dyn VulnerabilitySource, identifier: &CveId) -> Result<VulnerabilityRecord, VulnmapError> {
        info!(provider = source.provider_name(), "Looking up vulnerability record");
        let (status, payload) = source.lookup(identifier.as_str()).await.into_result()?;

        let payload = match payload {
            Payload::Json(value) => value,
            other => {
                debug!(status, payload = %other.describe(), "Lookup returned no JSON body");
                Value::Null
            }
        };

        let records = source.records(&payload);
        if records.len() > 1 {
            warn!(matches = records.len(), "Multiple records returned, using the first");
        }
        Ok(match records.first() {
            Some(record) => {
                let weaknesses = source.weaknesses(record);
                debug!(weaknesses = weaknesses.len(), "Record found");
                VulnerabilityRecord::new(identifier.clone(), weaknesses, (*record).clone())
            }
            None => {
                warn!("No matching record, continuing with placeholder");
                VulnerabilityRecord::placeholder(identifier.clone())
            }
        })
    }

    async fn analyze(
        &self,
        model: &dyn AnalysisModel,
        model_name: &str,
        messages: &[crate::connectors::ChatMessage],
    ) -> Result<AnalysisReply, VulnmapError> {
        info!(provider = model.provider_name(), model = model_name, "Requesting analysis");
        let (_, payload) = model
            .chat(model_name, messages, self.chat_parameters.as_ref())
            .await
            .into_result()?;

        let body = payload.as_json().ok_or_else(|| {
            VulnmapError::ContractViolation(format!("Model returned a non-JSON body: {}", payload.describe()))
        })?;
        let content = model
            .reply_content(body)
            .ok_or_else(|| VulnmapError::ContractViolation("Model reply has no message content".into()))?;

        AnalysisReply::parse(&content)
    }
}
