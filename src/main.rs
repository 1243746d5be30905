//! Binary entrypoint for the paper-feed aggregator.
//! Runs one aggregation pass: load the previously published feed, fetch and
//! filter every configured source, publish the merged result, and push an
//! optional summary notification. Intended to be invoked from cron or CI.
//!
//! See `README.md` for setup and the `RSS_*` environment knobs.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use paper_feed_aggregator::config::AppConfig;
use paper_feed_aggregator::fetch::{Fetcher, ReqwestTransport, DEFAULT_TIMEOUT_SECS};
use paper_feed_aggregator::ingest::{run_once, RunOptions};
use paper_feed_aggregator::notify::{notify_new_entries, FeishuNotifier};
use paper_feed_aggregator::output::{load_existing, publish};
use paper_feed_aggregator::query::QuerySet;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env first so RUST_LOG and the RSS_* knobs can come from it.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();

    let sources = config.load_sources();
    if sources.is_empty() {
        bail!(
            "no feed sources configured (checked RSS_SOURCES and {})",
            config.sources_file.display()
        );
    }
    let queries = QuerySet::parse(config.load_queries());
    if queries.is_empty() {
        bail!(
            "no queries configured (checked RSS_QUERIES and {})",
            config.queries_file.display()
        );
    }
    info!(
        sources = sources.len(),
        queries = queries.len(),
        output = %config.output_file.display(),
        "starting aggregation run"
    );

    let existing = load_existing(&config.output_file);

    let transport = ReqwestTransport::new(
        &config.user_agent,
        Duration::from_secs(DEFAULT_TIMEOUT_SECS),
    )
    .context("building HTTP transport")?;
    let fetcher = Fetcher::new(Box::new(transport))
        .with_retries(config.max_retries)
        .with_pace(config.request_sleep);

    let options = RunOptions {
        dblp_max_volumes: config.dblp_max_volumes,
        min_year: config.min_year,
    };
    let report = run_once(&fetcher, &sources, &queries, &existing, &options).await;

    publish(
        existing,
        report.new_entries.clone(),
        config.max_items,
        &config.channel,
        &config.output_file,
    )?;

    if !report.new_entries.is_empty() {
        let notifier = FeishuNotifier::new(config.webhook_url.clone(), &config.user_agent)?;
        if notifier.is_enabled() {
            notify_new_entries(&notifier, &report.new_entries, config.notify_max_items).await;
        }
    }

    Ok(())
}
