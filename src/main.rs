use std::path::PathBuf;

use clap::Parser;
use console::Term;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use vulnmap::cli::{self, Commands};
use vulnmap::config;
use vulnmap::errors::VulnmapError;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(!cli.no_color)
            .with_writer(std::io::stderr)
            .init();
    }
    if cli.no_color {
        console::set_colors_enabled(false);
    }

    debug!(
        version = env!("CARGO_PKG_VERSION"),
        built = env!("BUILD_TIMESTAMP"),
        git = option_env!("GIT_HASH").unwrap_or("unknown"),
        "vulnmap starting"
    );

    let result = run(cli).await;

    if let Err(e) = result {
        let class = e.classify();
        error!(error_type = class.error_type, "{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(exit_code(&e));
    }
}

async fn run(cli: cli::Cli) -> Result<(), VulnmapError> {
    let interactive = !cli.log_json && Term::stderr().is_term();
    let config_path = cli.config.as_ref().map(PathBuf::from);

    // `validate` reads its own file; every other command runs on the global config.
    let config = match &cli.command {
        Commands::Validate(_) => config::VulnmapConfig::default(),
        _ => config::load_config(config_path.as_deref()).await?,
    };

    match cli.command {
        Commands::Analyze(args) => cli::analyze::handle_analyze(args, &config, interactive).await,
        Commands::Search(args) => cli::search::handle_search(args, &config).await,
        Commands::Check(args) => cli::check::handle_check(args, &config).await,
        Commands::Validate(args) => cli::validate::handle_validate(args).await,
    }
}

fn exit_code(e: &VulnmapError) -> i32 {
    match e {
        VulnmapError::Config(_) | VulnmapError::Yaml(_) => 2,
        VulnmapError::Format(_) => 3,
        VulnmapError::Transport(_) | VulnmapError::UpstreamServer { .. } | VulnmapError::UpstreamClient { .. } => 4,
        VulnmapError::ContractViolation(_) => 5,
        _ => 1,
    }
}
