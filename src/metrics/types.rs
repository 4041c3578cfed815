use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Number of calendar days the traffic API reports for views and clones.
pub const TRAILING_WINDOW_DAYS: u64 = 14;

/// The two per-day metric kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Views,
    Clones,
}

impl MetricKind {
    pub const ALL: [MetricKind; 2] = [MetricKind::Views, MetricKind::Clones];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Views => "views",
            MetricKind::Clones => "clones",
        }
    }

    pub fn total_column(&self) -> String {
        format!("total_{}", self.as_str())
    }

    pub fn unique_column(&self) -> String {
        format!("unique_{}", self.as_str())
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One raw record as returned by the traffic API.
/// The timestamp may carry any offset; it is truncated to a UTC day on aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawEvent {
    pub timestamp: DateTime<Utc>,
    pub count: u64,
    pub uniques: u64,
}

/// Total and unique counts for a single calendar day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DailyCount {
    pub total: u64,
    pub unique: u64,
}

impl DailyCount {
    pub fn new(total: u64, unique: u64) -> Self {
        Self { total, unique }
    }

    /// True when `other` beats `self` on either field.
    pub fn is_exceeded_by(&self, other: &DailyCount) -> bool {
        other.total > self.total || other.unique > self.unique
    }

    fn absorb(&mut self, other: DailyCount) {
        self.total += other.total;
        self.unique += other.unique;
    }
}

/// Day-keyed counts straight out of the aggregator. Unordered.
pub type DailyCounts = HashMap<NaiveDate, DailyCount>;

/// Date-ordered history for one metric kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSeries {
    kind: MetricKind,
    days: BTreeMap<NaiveDate, DailyCount>,
}

impl TimeSeries {
    pub fn new(kind: MetricKind) -> Self {
        Self {
            kind,
            days: BTreeMap::new(),
        }
    }

    /// Builds a series from rows that may repeat a date. Repeats are summed.
    pub fn from_rows<I>(kind: MetricKind, rows: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, DailyCount)>,
    {
        let mut series = Self::new(kind);
        for (date, count) in rows {
            series.days.entry(date).or_default().absorb(count);
        }
        series
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn get(&self, date: &NaiveDate) -> Option<&DailyCount> {
        self.days.get(date)
    }

    pub fn insert(&mut self, date: NaiveDate, count: DailyCount) -> Option<DailyCount> {
        self.days.insert(date, count)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Ascending by date.
    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &DailyCount)> {
        self.days.iter()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.days.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.days.keys().next_back().copied()
    }

    /// Inserts a zero record for every missing day between the first and last date.
    /// Returns how many days were synthesized.
    pub fn fill_gaps(&mut self) -> usize {
        let (Some(first), Some(last)) = (self.first_date(), self.last_date()) else {
            return 0;
        };

        let mut filled = 0;
        for date in first.iter_days().take_while(|d| *d <= last) {
            if !self.days.contains_key(&date) {
                self.days.insert(date, DailyCount::default());
                filled += 1;
            }
        }
        filled
    }

    /// The `days` most recent calendar days, counted back from the latest date.
    pub fn trailing(&self, days: u64) -> TimeSeries {
        let mut window = TimeSeries::new(self.kind);
        let Some(last) = self.last_date() else {
            return window;
        };
        let start = last
            .checked_sub_days(Days::new(days.saturating_sub(1)))
            .unwrap_or(NaiveDate::MIN);
        window
            .days
            .extend(self.days.range(start..=last).map(|(d, c)| (*d, *c)));
        window
    }
}

/// The two "top-N" tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankedKind {
    ReferralSources,
    ReferralPaths,
}

impl RankedKind {
    pub const ALL: [RankedKind; 2] = [RankedKind::ReferralSources, RankedKind::ReferralPaths];

    pub fn as_str(&self) -> &'static str {
        match self {
            RankedKind::ReferralSources => "referral_sources",
            RankedKind::ReferralPaths => "referral_paths",
        }
    }

    /// Name of the identity column.
    pub fn natural_key(&self) -> &'static str {
        match self {
            RankedKind::ReferralSources => "referrer",
            RankedKind::ReferralPaths => "path",
        }
    }

    pub fn has_title(&self) -> bool {
        matches!(self, RankedKind::ReferralPaths)
    }
}

impl fmt::Display for RankedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a ranked table. `key` is the referrer or the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub key: String,
    pub title: Option<String>,
    pub count: u64,
    pub uniques: u64,
}

impl RankedEntry {
    pub fn referrer(referrer: impl Into<String>, count: u64, uniques: u64) -> Self {
        Self {
            key: referrer.into(),
            title: None,
            count,
            uniques,
        }
    }

    pub fn path(
        path: impl Into<String>,
        title: impl Into<String>,
        count: u64,
        uniques: u64,
    ) -> Self {
        Self {
            key: path.into(),
            title: Some(title.into()),
            count,
            uniques,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedTable {
    kind: RankedKind,
    entries: Vec<RankedEntry>,
}

impl RankedTable {
    pub fn new(kind: RankedKind, entries: Vec<RankedEntry>) -> Self {
        Self { kind, entries }
    }

    pub fn kind(&self) -> RankedKind {
        self.kind
    }

    pub fn entries(&self) -> &[RankedEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<RankedEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stable sort, highest count first. Equal counts keep their current order.
    pub fn sort_by_count(&mut self) {
        self.entries.sort_by(|a, b| b.count.cmp(&a.count));
    }
}
