use std::path::PathBuf;

use console::style;
use serde_json::Value;
use tracing::info;

use super::commands::AnalyzeArgs;
use super::progress::EnrichmentProgress;
use crate::config::{redact_credentials, VulnmapConfig};
use crate::enrichment::{EnrichmentOrchestrator, EnrichmentRequest, EventSink};
use crate::errors::VulnmapError;
use crate::http::RequestExecutor;
use crate::reporting::publish_artifacts;

pub async fn handle_analyze(args: AnalyzeArgs, config: &VulnmapConfig, interactive: bool) -> Result<(), VulnmapError> {
    let request = build_request(&args, config)?;
    let output_dir = config.output_directory(args.output.as_ref().map(PathBuf::from));
    info!(identifier = %request.identifier, provider = %request.provider, model = %request.model, "Starting enrichment");

    let orchestrator = EnrichmentOrchestrator::new(RequestExecutor::with_reqwest(config.proxy())?)
        .with_settings(config.connector_settings())
        .with_source_base_url(config.source_base_url())
        .with_analysis_base_url(config.analysis_base_url());

    let progress = if interactive {
        EnrichmentProgress::new(&request.identifier)
    } else {
        EnrichmentProgress::hidden(&request.identifier)
    };

    let secrets = [request.source_api_key.as_str(), request.model_api_key.as_str()];
    let (sink, mut rx) = EventSink::channel();
    let work = {
        let orchestrator = &orchestrator;
        let request = &request;
        let output_dir = &output_dir;
        let secrets = &secrets;
        async move {
            let artifacts = orchestrator
                .run(request, &sink)
                .await
                .map_err(|e| redact_error(e, secrets))?;
            publish_artifacts(output_dir, &artifacts, &sink).await
        }
    };
    let render = async {
        while let Some(event) = rx.recv().await {
            progress.handle_event(&event);
            if event.is_terminal() {
                break;
            }
        }
    };
    let (result, ()) = tokio::join!(work, render);

    for artifact in &result? {
        println!("  {} {}", style("→").cyan(), artifact.path.display());
    }
    Ok(())
}

fn build_request(args: &AnalyzeArgs, config: &VulnmapConfig) -> Result<EnrichmentRequest, VulnmapError> {
    let mut request = EnrichmentRequest::new(
        &args.identifier,
        &config.source_api_key(args.nvd_key.as_deref()),
        &config.analysis_api_key(args.openai_key.as_deref()),
    )
    .with_provider(args.source.as_deref().unwrap_or(config.source_provider()))
    .with_model(&config.model(args.model.as_deref()));
    request.analysis_provider = config.analysis_provider().to_string();

    if let Some(raw) = &args.context {
        let context: Value = serde_json::from_str(raw)
            .map_err(|e| VulnmapError::InvalidArgument(format!("--context is not valid JSON: {}", e)))?;
        request = request.with_context(context);
    }

    if request.model_api_key.is_empty() {
        return Err(VulnmapError::Config(
            "No analysis API key: pass --openai-key, set analysis.api_key or OPENAI_API_KEY".into(),
        ));
    }
    Ok(request)
}

/// Strip credentials from an upstream error before it reaches the terminal.
fn redact_error(err: VulnmapError, secrets: &[&str]) -> VulnmapError {
    match err {
        VulnmapError::UpstreamClient { status, message } => VulnmapError::UpstreamClient {
            status,
            message: redact_credentials(&message, secrets),
        },
        VulnmapError::UpstreamServer { status, message } => VulnmapError::UpstreamServer {
            status,
            message: redact_credentials(&message, secrets),
        },
        VulnmapError::Transport(message) => VulnmapError::Transport(redact_credentials(&message, secrets)),
        other => other,
    }
}
