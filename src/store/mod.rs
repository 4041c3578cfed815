pub mod csv_store;
pub mod memory;

pub use csv_store::{parse_day, CsvStore};
pub use memory::InMemoryStore;

use std::path::PathBuf;
use tracing::{info, warn};

use crate::error::Result;
use crate::metrics::{MetricKind, RankedKind, RankedTable, TimeSeries};

/// Where merged snapshots live between runs. Every save replaces the whole
/// snapshot for that kind.
pub trait SnapshotStore {
    fn load_series(&self, kind: MetricKind) -> Result<TimeSeries>;
    fn save_series(&self, series: &TimeSeries) -> Result<PathBuf>;
    fn load_table(&self, kind: RankedKind) -> Result<RankedTable>;
    fn save_table(&self, table: &RankedTable) -> Result<PathBuf>;
}

/// Loads the prior series, or `None` if it cannot be read for any reason.
/// A missing, corrupt or mismatched file all mean the same thing: start over.
pub fn prior_series<S: SnapshotStore + ?Sized>(store: &S, kind: MetricKind) -> Option<TimeSeries> {
    info!(kind = %kind, "Attempting to read existing metrics");
    match store.load_series(kind) {
        Ok(series) => Some(series),
        Err(e) => {
            warn!(kind = %kind, error = %e, "Starting new metrics record");
            None
        }
    }
}

/// Ranked-table counterpart of [`prior_series`].
pub fn prior_table<S: SnapshotStore + ?Sized>(store: &S, kind: RankedKind) -> Option<RankedTable> {
    info!(kind = %kind, "Attempting to read existing table");
    match store.load_table(kind) {
        Ok(table) => Some(table),
        Err(e) => {
            warn!(kind = %kind, error = %e, "Starting new table");
            None
        }
    }
}
