use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use super::SnapshotStore;
use crate::error::{Result, TrafficError};
use crate::metrics::{MetricKind, RankedKind, RankedTable, TimeSeries};

/// Keeps snapshots in process memory. Used by tests.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    series: RefCell<HashMap<MetricKind, TimeSeries>>,
    tables: RefCell<HashMap<RankedKind, RankedTable>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(self, series: TimeSeries) -> Self {
        self.series.borrow_mut().insert(series.kind(), series);
        self
    }

    pub fn with_table(self, table: RankedTable) -> Self {
        self.tables.borrow_mut().insert(table.kind(), table);
        self
    }

    pub fn series(&self, kind: MetricKind) -> Option<TimeSeries> {
        self.series.borrow().get(&kind).cloned()
    }

    pub fn table(&self, kind: RankedKind) -> Option<RankedTable> {
        self.tables.borrow().get(&kind).cloned()
    }
}

fn location(name: &str) -> PathBuf {
    PathBuf::from(format!("memory://{name}"))
}

fn missing(name: &str) -> TrafficError {
    TrafficError::io(
        io::Error::new(io::ErrorKind::NotFound, "no snapshot stored"),
        location(name),
    )
}

impl SnapshotStore for InMemoryStore {
    fn load_series(&self, kind: MetricKind) -> Result<TimeSeries> {
        self.series(kind).ok_or_else(|| missing(kind.as_str()))
    }

    fn save_series(&self, series: &TimeSeries) -> Result<PathBuf> {
        self.series.borrow_mut().insert(series.kind(), series.clone());
        Ok(location(series.kind().as_str()))
    }

    fn load_table(&self, kind: RankedKind) -> Result<RankedTable> {
        self.table(kind).ok_or_else(|| missing(kind.as_str()))
    }

    fn save_table(&self, table: &RankedTable) -> Result<PathBuf> {
        self.tables.borrow_mut().insert(table.kind(), table.clone());
        Ok(location(table.kind().as_str()))
    }
}
