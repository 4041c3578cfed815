use anyhow::Context;
use chrono::Utc;
use tracing_subscriber::EnvFilter;

use traffic_ledger::config::Config;
use traffic_ledger::pipeline;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("reading configuration from the environment")?;
    let today = Utc::now().date_naive();

    tracing::info!(repository = %config.repository, %today, "Traffic ledger run starting");

    let report = pipeline::run(&config, today)
        .await
        .with_context(|| format!("traffic run for {} failed", config.repository))?;

    for (kind, stats) in &report.series {
        tracing::info!(%kind, ?stats, "Series summary");
    }
    for (kind, stats) in &report.tables {
        tracing::info!(%kind, ?stats, "Table summary");
    }
    tracing::info!(files = report.written.len(), presented = ?report.presented, "Run complete");
    let summary = report.to_json()?;
    tracing::debug!(%summary, "Run report");
    Ok(())
}
