use chrono::{Days, NaiveDate};
use tracing::debug;

use super::types::{DailyCount, DailyCounts, MetricKind, RawEvent, TRAILING_WINDOW_DAYS};

/// Collapses raw API records into one count per UTC day and pads the
/// trailing window ending at `today` with zero days.
///
/// Records that land on the same day are summed, never overwritten.
/// An empty payload still produces the full zero-filled window.
pub fn aggregate(events: &[RawEvent], kind: MetricKind, today: NaiveDate) -> DailyCounts {
    let mut counts = DailyCounts::with_capacity(TRAILING_WINDOW_DAYS as usize);

    for event in events {
        let day = event.timestamp.date_naive();
        let slot = counts.entry(day).or_default();
        slot.total += event.count;
        slot.unique += event.uniques;
    }

    let mut padded = 0;
    for day in window(today) {
        counts.entry(day).or_insert_with(|| {
            padded += 1;
            DailyCount::default()
        });
    }

    debug!(
        kind = %kind,
        raw = events.len(),
        days = counts.len(),
        padded,
        "Aggregated raw records"
    );
    counts
}

/// The inclusive 14-day window `[today - 13, today]`.
pub fn window(today: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let start = today
        .checked_sub_days(Days::new(TRAILING_WINDOW_DAYS - 1))
        .unwrap_or(NaiveDate::MIN);
    start.iter_days().take_while(move |d| *d <= today)
}
