use console::style;

use super::commands::CheckArgs;
use crate::config::{mask_key, VulnmapConfig};
use crate::connectors::{create_analysis, create_source, AnalysisProvider, SourceProvider};
use crate::errors::VulnmapError;
use crate::http::{ConnectionCheck, RequestExecutor};

pub async fn handle_check(args: CheckArgs, config: &VulnmapConfig) -> Result<(), VulnmapError> {
    let executor = RequestExecutor::with_reqwest(config.proxy())?;
    let settings = config.connector_settings();

    let source_key = config.source_api_key(args.nvd_key.as_deref());
    let model_key = config.analysis_api_key(args.openai_key.as_deref());

    let source_provider: SourceProvider = config.source_provider().parse()?;
    let analysis_provider: AnalysisProvider = config.analysis_provider().parse()?;

    let source = create_source(
        source_provider,
        &source_key,
        executor.clone(),
        config.source_base_url().as_deref(),
        settings.clone(),
    );
    let model = create_analysis(
        analysis_provider,
        &model_key,
        executor,
        config.analysis_base_url().as_deref(),
        settings,
    );

    let (source_check, model_check) = tokio::join!(source.test_connection(), model.test_connection());
    print_check(source.provider_name(), &source_key, &source_check);
    print_check(model.provider_name(), &model_key, &model_check);

    if source_check.success && model_check.success {
        Ok(())
    } else {
        let failed: Vec<&str> = [(&source_check, source.provider_name()), (&model_check, model.provider_name())]
            .into_iter()
            .filter(|(check, _)| !check.success)
            .map(|(_, name)| name)
            .collect();
        Err(VulnmapError::UpstreamClient {
            status: None,
            message: format!("Connection check failed for: {}", failed.join(", ")),
        })
    }
}

fn print_check(provider: &str, key: &str, check: &ConnectionCheck) {
    let mark = if check.success { style("✓").green() } else { style("✗").red() };
    let key = if key.is_empty() { "(no key)".to_string() } else { mask_key(key) };
    let detail = match check.detail.as_str() {
        Some(text) => text.to_string(),
        None => check.detail.to_string(),
    };
    println!("  {} {:<8} {} {}: {}", mark, provider, style(key).dim(), check.message, detail);
}
