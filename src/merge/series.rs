use tracing::{debug, warn};

use super::{MergeStats, MergeStrategy, Merged};
use crate::metrics::{DailyCounts, MetricKind, TimeSeries};

/// Per-day counts never decrease once recorded.
///
/// The incoming record replaces the stored one only when it is strictly
/// greater on total or on unique, and then it replaces it as a whole.
#[derive(Debug, Clone, Copy)]
pub struct HighWaterMark {
    kind: MetricKind,
}

impl HighWaterMark {
    pub fn new(kind: MetricKind) -> Self {
        Self { kind }
    }
}

impl MergeStrategy for HighWaterMark {
    type Record = TimeSeries;
    type Incoming = DailyCounts;

    fn merge(&self, existing: Option<TimeSeries>, incoming: DailyCounts) -> Merged<TimeSeries> {
        let mut stats = MergeStats::default();

        let mut series = match existing {
            None => {
                stats.fresh_start = true;
                stats.added = incoming.len();
                TimeSeries::from_rows(self.kind, incoming)
            }
            Some(mut series) => {
                if series.kind() != self.kind {
                    warn!(expected = %self.kind, found = %series.kind(), "Prior series kind differs");
                }
                for (date, count) in incoming {
                    match series.get(&date).map(|prior| prior.is_exceeded_by(&count)) {
                        None => {
                            series.insert(date, count);
                            stats.added += 1;
                        }
                        Some(true) => {
                            series.insert(date, count);
                            stats.replaced += 1;
                        }
                        Some(false) => stats.unchanged += 1,
                    }
                }
                series
            }
        };

        stats.filled = series.fill_gaps();

        debug!(kind = %self.kind, ?stats, days = series.len(), "Merged time series");
        Merged {
            value: series,
            stats,
        }
    }
}
