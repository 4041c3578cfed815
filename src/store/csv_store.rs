use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::{ReaderBuilder, StringRecord, Writer};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

use super::SnapshotStore;
use crate::error::{Result, TrafficError};
use crate::metrics::{DailyCount, MetricKind, RankedEntry, RankedKind, RankedTable, TimeSeries};

const DATE_COLUMN: &str = "_date";

/// Delimited-text snapshots under a single directory:
/// `views.csv`, `clones.csv`, `referral_sources.csv`, `referral_paths.csv`.
#[derive(Debug, Clone)]
pub struct CsvStore {
    root: PathBuf,
}

impl CsvStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates the directory if it does not exist yet.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| TrafficError::io(e, &root))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn series_path(&self, kind: MetricKind) -> PathBuf {
        self.root.join(format!("{}.csv", kind.as_str()))
    }

    pub fn table_path(&self, kind: RankedKind) -> PathBuf {
        self.root.join(format!("{}.csv", kind.as_str()))
    }
}

fn series_header(kind: MetricKind) -> Vec<String> {
    vec![DATE_COLUMN.to_string(), kind.total_column(), kind.unique_column()]
}

fn table_header(kind: RankedKind) -> Vec<String> {
    let mut header = vec![kind.natural_key().to_string()];
    if kind.has_title() {
        header.push("title".to_string());
    }
    header.push("count".to_string());
    header.push("uniques".to_string());
    header
}

fn open(path: &Path, expected: &[String]) -> Result<csv::Reader<File>> {
    let file = File::open(path).map_err(|e| TrafficError::io(e, path))?;
    let mut reader = ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(file);

    let found: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if found != expected {
        return Err(TrafficError::Schema {
            path: path.to_path_buf(),
            expected: expected.to_vec(),
            found,
        });
    }
    Ok(reader)
}

fn field<'r>(record: &'r StringRecord, idx: usize, path: &Path) -> Result<&'r str> {
    record.get(idx).ok_or_else(|| row_error(record, path, format!("missing column {idx}")))
}

fn count(record: &StringRecord, idx: usize, path: &Path) -> Result<u64> {
    let raw = field(record, idx, path)?.trim();
    raw.parse()
        .map_err(|_| row_error(record, path, format!("'{raw}' is not a count")))
}

fn row_error(record: &StringRecord, path: &Path, reason: String) -> TrafficError {
    TrafficError::Row {
        path: path.to_path_buf(),
        line: record.position().map(|p| p.line()).unwrap_or(0),
        reason,
    }
}

/// Reduces any date or timestamp string to its calendar day.
///
/// Offset-carrying timestamps are converted to UTC before truncation, so
/// `2024-01-01T23:30:00-02:00` is 2024-01-02.
pub fn parse_day(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(day);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc).date_naive());
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Ok(ts.with_timezone(&Utc).date_naive());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(ts.date());
        }
    }
    Err(TrafficError::Date(raw.to_string()))
}

impl SnapshotStore for CsvStore {
    fn load_series(&self, kind: MetricKind) -> Result<TimeSeries> {
        let path = self.series_path(kind);
        let mut reader = open(&path, &series_header(kind))?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let day = parse_day(field(&record, 0, &path)?)?;
            let total = count(&record, 1, &path)?;
            let unique = count(&record, 2, &path)?;
            rows.push((day, DailyCount::new(total, unique)));
        }

        info!(kind = %kind, rows = rows.len(), path = %path.display(), "Read existing series");
        Ok(TimeSeries::from_rows(kind, rows))
    }

    fn save_series(&self, series: &TimeSeries) -> Result<PathBuf> {
        let path = self.series_path(series.kind());
        let file = File::create(&path).map_err(|e| TrafficError::io(e, &path))?;
        let mut writer = Writer::from_writer(file);

        writer.write_record(series_header(series.kind()))?;
        for (day, count) in series.iter() {
            writer.write_record([
                day.format("%Y-%m-%d").to_string(),
                count.total.to_string(),
                count.unique.to_string(),
            ])?;
        }
        writer.flush().map_err(|e| TrafficError::io(e, &path))?;

        info!(kind = %series.kind(), rows = series.len(), path = %path.display(), "Wrote series");
        Ok(path)
    }

    fn load_table(&self, kind: RankedKind) -> Result<RankedTable> {
        let path = self.table_path(kind);
        let mut reader = open(&path, &table_header(kind))?;

        let mut entries = Vec::new();
        for record in reader.records() {
            let record = record?;
            let key = field(&record, 0, &path)?.to_string();
            let entry = if kind.has_title() {
                RankedEntry {
                    key,
                    title: Some(field(&record, 1, &path)?.to_string()),
                    count: count(&record, 2, &path)?,
                    uniques: count(&record, 3, &path)?,
                }
            } else {
                RankedEntry {
                    key,
                    title: None,
                    count: count(&record, 1, &path)?,
                    uniques: count(&record, 2, &path)?,
                }
            };
            entries.push(entry);
        }

        info!(kind = %kind, rows = entries.len(), path = %path.display(), "Read existing table");
        Ok(RankedTable::new(kind, entries))
    }

    fn save_table(&self, table: &RankedTable) -> Result<PathBuf> {
        let kind = table.kind();
        let path = self.table_path(kind);
        let file = File::create(&path).map_err(|e| TrafficError::io(e, &path))?;
        let mut writer = Writer::from_writer(file);

        writer.write_record(table_header(kind))?;
        for entry in table.entries() {
            let mut record = vec![entry.key.clone()];
            if kind.has_title() {
                record.push(entry.title.clone().unwrap_or_default());
            }
            record.push(entry.count.to_string());
            record.push(entry.uniques.to_string());
            writer.write_record(&record)?;
        }
        writer.flush().map_err(|e| TrafficError::io(e, &path))?;

        info!(kind = %kind, rows = table.len(), path = %path.display(), "Wrote table");
        Ok(path)
    }
}
