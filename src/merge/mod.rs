//! Reconciliation of a freshly fetched snapshot against persisted history.
//!
//! Per-day counts only ever move up ([`HighWaterMark`]). Ranked tables take
//! whatever was fetched last ([`LastWriteWins`]).

pub mod ranked;
pub mod series;

pub use ranked::LastWriteWins;
pub use series::HighWaterMark;

use serde::Serialize;

/// A merge policy. `existing` is `None` when there is no usable prior state,
/// which is a different thing from prior state that happens to be empty.
pub trait MergeStrategy {
    type Record;
    type Incoming;

    fn merge(&self, existing: Option<Self::Record>, incoming: Self::Incoming) -> Merged<Self::Record>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merged<T> {
    pub value: T,
    pub stats: MergeStats,
}

/// What a single merge did, for logging and the run report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    /// No prior state was available.
    pub fresh_start: bool,
    /// Keys seen for the first time.
    pub added: usize,
    /// Keys whose prior record was replaced by the incoming one.
    pub replaced: usize,
    /// Incoming keys that lost to the prior record.
    pub unchanged: usize,
    /// Days synthesized as zero to close gaps.
    pub filled: usize,
}
