//! One run: fetch, merge against what is on disk, persist, present.

use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use crate::config::{Config, Mode};
use crate::error::Result;
use crate::merge::{HighWaterMark, LastWriteWins, MergeStats, MergeStrategy};
use crate::metrics::{
    aggregate, MetricKind, RankedKind, RankedTable, RawEvent, TimeSeries, TRAILING_WINDOW_DAYS,
};
use crate::present::{build_payload, write_chart};
use crate::services::{TrafficClient, TrafficSnapshot, UploadClient};
use crate::store::{prior_series, prior_table, CsvStore, SnapshotStore};

/// Merged state after a run, exactly as persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub views: TimeSeries,
    pub clones: TimeSeries,
    pub referral_sources: RankedTable,
    pub referral_paths: RankedTable,
    pub report: RunReport,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub series: Vec<(MetricKind, MergeStats)>,
    pub tables: Vec<(RankedKind, MergeStats)>,
    pub written: Vec<PathBuf>,
    pub presented: Option<Presented>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presented {
    Chart(PathBuf),
    Upload(u16),
}

impl RunReport {
    /// Single-line JSON summary, logged at the end of a run.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Merges a fetched snapshot into `store` and writes the results back.
///
/// Each kind is read, merged and written in full. Prior state that cannot be
/// read is treated as no history. Write failures are returned.
pub fn reconcile<S: SnapshotStore + ?Sized>(
    snapshot: TrafficSnapshot,
    store: &S,
    today: NaiveDate,
) -> Result<Reconciled> {
    let mut report = RunReport::default();

    let views = merge_series(store, MetricKind::Views, &snapshot.views, today, &mut report)?;
    let clones = merge_series(store, MetricKind::Clones, &snapshot.clones, today, &mut report)?;
    let referral_sources = merge_table(store, snapshot.referral_sources, &mut report)?;
    let referral_paths = merge_table(store, snapshot.referral_paths, &mut report)?;

    Ok(Reconciled {
        views,
        clones,
        referral_sources,
        referral_paths,
        report,
    })
}

fn merge_series<S: SnapshotStore + ?Sized>(
    store: &S,
    kind: MetricKind,
    events: &[RawEvent],
    today: NaiveDate,
    report: &mut RunReport,
) -> Result<TimeSeries> {
    let incoming = aggregate(events, kind, today);
    let prior = prior_series(store, kind);
    let merged = HighWaterMark::new(kind).merge(prior, incoming);

    info!(
        kind = %kind,
        fresh = merged.stats.fresh_start,
        added = merged.stats.added,
        raised = merged.stats.replaced,
        unchanged = merged.stats.unchanged,
        filled = merged.stats.filled,
        "Merged series"
    );

    report.written.push(store.save_series(&merged.value)?);
    report.series.push((kind, merged.stats));
    Ok(merged.value)
}

fn merge_table<S: SnapshotStore + ?Sized>(
    store: &S,
    incoming: RankedTable,
    report: &mut RunReport,
) -> Result<RankedTable> {
    let kind = incoming.kind();
    let prior = prior_table(store, kind);
    let merged = LastWriteWins::new(kind).merge(prior, incoming);

    info!(
        kind = %kind,
        fresh = merged.stats.fresh_start,
        added = merged.stats.added,
        replaced = merged.stats.replaced,
        rows = merged.value.len(),
        "Merged table"
    );

    report.written.push(store.save_table(&merged.value)?);
    report.tables.push((kind, merged.stats));
    Ok(merged.value)
}

/// Full run against the configured repository and output directory.
pub async fn run(config: &Config, today: NaiveDate) -> Result<RunReport> {
    info!(path = %config.output_dir.display(), "Workplace path");
    let store = CsvStore::create(&config.output_dir)?;

    let client = TrafficClient::new(&config.api_url, &config.repository, config.token.clone())?;
    let snapshot = client.fetch_snapshot().await?;

    let mut reconciled = reconcile(snapshot, &store, today)?;

    let presented = match &config.mode {
        Mode::Chart => {
            let path = config.chart_path();
            write_chart(
                &path,
                &reconciled.views.trailing(TRAILING_WINDOW_DAYS),
                &reconciled.clones.trailing(TRAILING_WINDOW_DAYS),
            )?;
            Presented::Chart(path)
        }
        Mode::Upload { key } => {
            let payload = build_payload(
                &config.repository,
                &reconciled.views,
                &reconciled.clones,
                &reconciled.referral_sources,
                &reconciled.referral_paths,
            );
            let status = UploadClient::new(&config.upload_url, key.clone())?
                .put(&payload)
                .await?;
            Presented::Upload(status.as_u16())
        }
    };

    reconciled.report.presented = Some(presented);
    Ok(reconciled.report)
}
