use chrono::{NaiveDate, TimeZone, Utc};
use std::fs;
use tempfile::TempDir;
use traffic_ledger::config::{Config, Mode};
use traffic_ledger::metrics::{
    DailyCount, MetricKind, RankedEntry, RankedKind, RankedTable, RawEvent, TimeSeries,
};
use traffic_ledger::reconcile;
use traffic_ledger::services::TrafficSnapshot;
use traffic_ledger::store::{CsvStore, InMemoryStore, SnapshotStore};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 2, 14).unwrap()
}

fn event(m: u32, d: u32, count: u64, uniques: u64) -> RawEvent {
    RawEvent {
        timestamp: Utc.with_ymd_and_hms(2024, m, d, 0, 0, 0).unwrap(),
        count,
        uniques,
    }
}

fn snapshot() -> TrafficSnapshot {
    TrafficSnapshot {
        views: vec![event(2, 10, 30, 8), event(2, 14, 5, 2)],
        clones: vec![event(2, 12, 4, 1)],
        referral_sources: RankedTable::new(
            RankedKind::ReferralSources,
            vec![RankedEntry::referrer("github.com", 3, 1), RankedEntry::referrer("news.example", 9, 7)],
        ),
        referral_paths: RankedTable::new(
            RankedKind::ReferralPaths,
            vec![RankedEntry::path("/o/r", "o/r", 12, 5)],
        ),
    }
}

#[test]
fn test_first_run_persists_full_window() {
    let store = InMemoryStore::new();
    let out = reconcile(snapshot(), &store, today()).unwrap();

    assert_eq!(out.views.len(), 14);
    assert_eq!(out.clones.len(), 14);
    assert_eq!(
        out.views.get(&NaiveDate::from_ymd_opt(2024, 2, 10).unwrap()),
        Some(&DailyCount::new(30, 8))
    );
    assert_eq!(store.series(MetricKind::Views), Some(out.views.clone()));
    assert_eq!(out.referral_sources.entries()[0].key, "news.example");
    assert!(out.report.series.iter().all(|(_, s)| s.fresh_start));
    assert_eq!(out.report.written.len(), 4);
}

#[test]
fn test_history_accumulates_across_runs() {
    let older = TimeSeries::from_rows(
        MetricKind::Views,
        vec![
            (NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(), DailyCount::new(2, 2)),
            (NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(), DailyCount::new(50, 3)),
        ],
    );
    let store = InMemoryStore::new()
        .with_series(older)
        .with_table(RankedTable::new(
            RankedKind::ReferralSources,
            vec![RankedEntry::referrer("github.com", 40, 10), RankedEntry::referrer("old.example", 2, 1)],
        ));

    let out = reconcile(snapshot(), &store, today()).unwrap();

    // 2024-01-20 through 2024-02-14, contiguous.
    assert_eq!(out.views.len(), 26);
    assert_eq!(
        out.views.get(&NaiveDate::from_ymd_opt(2024, 1, 25).unwrap()),
        Some(&DailyCount::default())
    );
    // incoming (30, 8) beats (50, 3) on uniques
    assert_eq!(
        out.views.get(&NaiveDate::from_ymd_opt(2024, 2, 10).unwrap()),
        Some(&DailyCount::new(30, 8))
    );

    let sources: Vec<(&str, u64)> = out
        .referral_sources
        .entries()
        .iter()
        .map(|e| (e.key.as_str(), e.count))
        .collect();
    assert_eq!(sources, vec![("news.example", 9), ("github.com", 3), ("old.example", 2)]);
}

#[test]
fn test_second_identical_run_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let store = CsvStore::new(dir.path());

    let first = reconcile(snapshot(), &store, today()).unwrap();
    let views_file = fs::read_to_string(store.series_path(MetricKind::Views)).unwrap();
    let second = reconcile(snapshot(), &store, today()).unwrap();

    assert_eq!(first.views, second.views);
    assert_eq!(first.referral_sources, second.referral_sources);
    assert_eq!(
        views_file,
        fs::read_to_string(store.series_path(MetricKind::Views)).unwrap()
    );
    assert!(second.report.series.iter().all(|(_, s)| s.replaced == 0 && s.added == 0));
}

#[test]
fn test_corrupt_prior_file_starts_fresh() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("views.csv"), "garbage\n\u{0}\u{1}").unwrap();
    let store = CsvStore::new(dir.path());

    let out = reconcile(snapshot(), &store, today()).unwrap();

    let (_, stats) = out.report.series[0];
    assert!(stats.fresh_start);
    assert_eq!(store.load_series(MetricKind::Views).unwrap(), out.views);
}

#[tokio::test]
async fn test_fetch_failure_persists_nothing() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        repository: "owner/repo".to_string(),
        token: "token".to_string(),
        output_dir: dir.path().join("traffic"),
        api_url: "http://127.0.0.1:9".to_string(),
        upload_url: "http://127.0.0.1:9/upload".to_string(),
        mode: Mode::Chart,
    };

    let result = traffic_ledger::run(&config, today()).await;

    assert!(result.is_err());
    let written: Vec<_> = fs::read_dir(&config.output_dir).unwrap().collect();
    assert!(written.is_empty(), "no snapshot files should be written");
}

#[test]
fn test_run_report_serializes_to_json() {
    let store = InMemoryStore::new();
    let out = reconcile(snapshot(), &store, today()).unwrap();

    let json: serde_json::Value = serde_json::from_str(&out.report.to_json().unwrap()).unwrap();
    assert_eq!(json["series"][0][0], "views");
    assert_eq!(json["series"][0][1]["fresh_start"], true);
    assert_eq!(json["tables"][1][0], "referral_paths");
    assert_eq!(json["written"].as_array().unwrap().len(), 4);
    assert!(json["presented"].is_null());
}
