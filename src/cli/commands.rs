use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "vulnmap", version, about = "Map CVEs to ATT&CK techniques, threat graphs and analyst reports")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Enrich one CVE and write its four artifacts
    Analyze(AnalyzeArgs),
    /// Search the vulnerability source
    Search(SearchArgs),
    /// Check credentials against both providers
    Check(CheckArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

#[derive(Args, Clone)]
pub struct AnalyzeArgs {
    /// CVE identifier, e.g. CVE-2021-44228
    pub identifier: String,

    /// Vulnerability source: nvd
    #[arg(long)]
    pub source: Option<String>,

    /// Analysis model identifier
    #[arg(long)]
    pub model: Option<String>,

    /// NVD API key (or NVD_API_KEY)
    #[arg(long)]
    pub nvd_key: Option<String>,

    /// OpenAI API key (or OPENAI_API_KEY)
    #[arg(long)]
    pub openai_key: Option<String>,

    /// Extra context for the analysis, as JSON
    #[arg(long)]
    pub context: Option<String>,

    /// Output directory for the artifacts
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(Args, Clone)]
pub struct SearchArgs {
    /// CVSS v3 severity: low, medium, high, critical
    #[arg(long)]
    pub severity: Option<String>,

    /// CWE identifier, e.g. CWE-79
    #[arg(long)]
    pub cwe: Option<String>,

    /// Keyword to match in descriptions
    #[arg(long)]
    pub keyword: Option<String>,

    /// Published on or after (YYYY-MM-DD or ISO-8601); requires --pub-end
    #[arg(long)]
    pub pub_start: Option<String>,

    /// Published on or before (YYYY-MM-DD or ISO-8601); requires --pub-start
    #[arg(long)]
    pub pub_end: Option<String>,

    /// Results per page (1-2000)
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Zero-based index of the first result
    #[arg(long)]
    pub start_index: Option<u32>,

    /// NVD API key (or NVD_API_KEY)
    #[arg(long)]
    pub nvd_key: Option<String>,
}

#[derive(Args, Clone)]
pub struct CheckArgs {
    /// NVD API key (or NVD_API_KEY)
    #[arg(long)]
    pub nvd_key: Option<String>,

    /// OpenAI API key (or OPENAI_API_KEY)
    #[arg(long)]
    pub openai_key: Option<String>,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Config file to validate
    pub file: String,
}
