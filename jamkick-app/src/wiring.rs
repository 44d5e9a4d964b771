//! Turns a loaded [`JamkickConfig`] into a ready-to-run fetcher.
use anyhow::{Context, Result};
use jamkick_common::observability::LogConfig;
use jamkick_config::{DisplayMode, JamkickConfig, LoggingConfig};
use jamkick_http::HttpClient;
use jamkick_pager::{
    FetcherOptions, HttpPageSource, PaginatedFetcher, ResultsView, SentinelId, UpdateMode,
};
use std::sync::Arc;
use std::time::Duration;

pub fn log_config(cfg: &LoggingConfig) -> LogConfig {
    LogConfig {
        log_dir: cfg.dir.clone(),
        emit_stderr: cfg.stderr,
        format: cfg.format,
        default_filter: cfg.level.clone(),
        ..LogConfig::default()
    }
}

pub fn build_fetcher(cfg: &JamkickConfig, view: Arc<dyn ResultsView>) -> Result<PaginatedFetcher> {
    let results = &cfg.results;

    let mut http = HttpClient::new(&results.base_url)
        .with_context(|| format!("invalid results.base_url: {}", results.base_url))?
        .with_retries(results.retries);
    if let Some(secs) = results.request_timeout_secs {
        http = http.with_timeout(Duration::from_secs(secs));
    }

    let marker = SentinelId::new(&results.sentinel_id)
        .with_context(|| format!("invalid results.sentinel_id: {}", results.sentinel_id))?;

    let options = FetcherOptions {
        mode: match cfg.display.mode {
            DisplayMode::Append => UpdateMode::Append,
            DisplayMode::Replace => UpdateMode::Replace,
        },
        max_pages: results.max_pages,
        loading_markup: cfg.display.loading_markup.clone(),
        failure_message: cfg.display.failure_message.clone(),
    };

    tracing::debug!(
        base_url = %results.base_url,
        path = %results.path,
        sentinel_id = %results.sentinel_id,
        max_pages = ?results.max_pages,
        retries = results.retries,
        "wiring.fetcher"
    );

    Ok(PaginatedFetcher::new(
        Arc::new(HttpPageSource::new(http, results.path.clone())),
        view,
        Arc::new(marker),
    )
    .with_options(options))
}
