use std::path::PathBuf;

use console::style;

use super::commands::ValidateArgs;
use crate::config::{parse_config, schema_warnings};
use crate::errors::VulnmapError;

pub async fn handle_validate(args: ValidateArgs) -> Result<(), VulnmapError> {
    let path = PathBuf::from(&args.file);
    let config = parse_config(&path).await?;

    let content = tokio::fs::read_to_string(&path).await?;
    if !content.trim().is_empty() {
        let yaml: serde_yaml::Value = serde_yaml::from_str(&content)?;
        for warning in schema_warnings(&yaml)? {
            println!("  {} {}", style("warning:").yellow(), warning);
        }
    }

    println!("Configuration is valid: {}", args.file);
    println!("  source:   {}", config.source_provider());
    println!("  analysis: {} ({})", config.analysis_provider(), config.model(None));
    Ok(())
}
