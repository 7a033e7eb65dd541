use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::commands::SearchArgs;
use crate::config::VulnmapConfig;
use crate::connectors::{create_source, SearchFilters, Severity, SourceProvider};
use crate::errors::VulnmapError;
use crate::http::RequestExecutor;
use crate::reporting::to_pretty_json;

/// Timestamp layout NVD expects for `pubStartDate`/`pubEndDate`.
const NVD_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

pub async fn handle_search(args: SearchArgs, config: &VulnmapConfig) -> Result<(), VulnmapError> {
    let filters = build_filters(&args)?;
    let provider: SourceProvider = config.source_provider().parse()?;
    let source = create_source(
        provider,
        &config.source_api_key(args.nvd_key.as_deref()),
        RequestExecutor::with_reqwest(config.proxy())?,
        config.source_base_url().as_deref(),
        config.connector_settings(),
    );

    let (_, payload) = source.search(&filters).await.into_result()?;
    match payload.as_json() {
        Some(json) => println!("{}", to_pretty_json(json)?),
        None => println!("{}", payload.describe()),
    }
    Ok(())
}

fn build_filters(args: &SearchArgs) -> Result<SearchFilters, VulnmapError> {
    let filters = SearchFilters {
        severity: args.severity.as_deref().map(str::parse::<Severity>).transpose()?,
        cwe_id: args.cwe.clone(),
        keyword: args.keyword.clone(),
        published_start: args.pub_start.as_deref().map(|d| nvd_timestamp(d, false)).transpose()?,
        published_end: args.pub_end.as_deref().map(|d| nvd_timestamp(d, true)).transpose()?,
        page_size: args.page_size,
        start_index: args.start_index,
        ..Default::default()
    };
    filters.validate()?;
    Ok(filters)
}

/// Accept `YYYY-MM-DD`, naive ISO-8601 or RFC 3339 and render in NVD's
/// layout. A bare end date covers the whole day.
fn nvd_timestamp(raw: &str, end_of_day: bool) -> Result<String, VulnmapError> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let time = if end_of_day { date.and_hms_milli_opt(23, 59, 59, 999) } else { date.and_hms_opt(0, 0, 0) };
        if let Some(ts) = time {
            return Ok(ts.format(NVD_DATE_FORMAT).to_string());
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.naive_utc().format(NVD_DATE_FORMAT).to_string());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(ts.format(NVD_DATE_FORMAT).to_string());
    }
    Err(VulnmapError::InvalidArgument(format!(
        "Invalid date '{}': expected YYYY-MM-DD or an ISO-8601 timestamp",
        raw
    )))
}
