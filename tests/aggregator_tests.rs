use chrono::{NaiveDate, TimeZone, Utc};
use traffic_ledger::metrics::{aggregate, DailyCount, MetricKind, RawEvent};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 20).unwrap()
}

fn event(d: u32, h: u32, count: u64, uniques: u64) -> RawEvent {
    RawEvent {
        timestamp: Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap(),
        count,
        uniques,
    }
}

#[test]
fn test_empty_payload_yields_zero_filled_window() {
    let counts = aggregate(&[], MetricKind::Views, today());

    assert_eq!(counts.len(), 14);
    assert!(counts.values().all(|c| *c == DailyCount::default()));
    assert!(counts.contains_key(&NaiveDate::from_ymd_opt(2024, 1, 7).unwrap()));
    assert!(counts.contains_key(&today()));
    assert!(!counts.contains_key(&NaiveDate::from_ymd_opt(2024, 1, 6).unwrap()));
}

#[test]
fn test_same_day_records_are_summed() {
    let counts = aggregate(
        &[event(15, 0, 3, 2), event(15, 12, 4, 1)],
        MetricKind::Clones,
        today(),
    );
    let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    assert_eq!(counts.get(&day), Some(&DailyCount::new(7, 3)));
}

#[test]
fn test_timestamps_truncate_to_utc_day() {
    let late = RawEvent {
        timestamp: "2024-01-14T23:30:00-02:00".parse().unwrap(),
        count: 5,
        uniques: 5,
    };
    let counts = aggregate(&[late], MetricKind::Views, today());
    let utc_day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    assert_eq!(counts.get(&utc_day), Some(&DailyCount::new(5, 5)));
}

#[test]
fn test_days_outside_window_are_kept() {
    let counts = aggregate(&[event(1, 0, 2, 1)], MetricKind::Views, today());
    assert_eq!(counts.len(), 15);
    assert_eq!(
        counts.get(&NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
        Some(&DailyCount::new(2, 1))
    );
}

#[test]
fn test_payload_deserializes_from_api_shape() {
    let raw = r#"[{"timestamp":"2024-01-19T00:00:00Z","count":12,"uniques":4}]"#;
    let events: Vec<RawEvent> = serde_json::from_str(raw).unwrap();
    let counts = aggregate(&events, MetricKind::Views, today());
    assert_eq!(
        counts.get(&NaiveDate::from_ymd_opt(2024, 1, 19).unwrap()),
        Some(&DailyCount::new(12, 4))
    );
}
