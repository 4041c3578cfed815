use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use super::{MergeStats, MergeStrategy, Merged};
use crate::metrics::{RankedEntry, RankedKind, RankedTable};

/// Ranked tables are a point-in-time top-N list, so the fetched row for a key
/// replaces the stored one whatever its magnitude.
///
/// Rows are concatenated (stored first, fetched last), only the last row per
/// natural key survives, and the survivors are stably sorted by count,
/// highest first. Equal counts stay in concatenation order.
#[derive(Debug, Clone, Copy)]
pub struct LastWriteWins {
    kind: RankedKind,
}

impl LastWriteWins {
    pub fn new(kind: RankedKind) -> Self {
        Self { kind }
    }
}

impl MergeStrategy for LastWriteWins {
    type Record = RankedTable;
    type Incoming = RankedTable;

    fn merge(&self, existing: Option<RankedTable>, incoming: RankedTable) -> Merged<RankedTable> {
        let mut stats = MergeStats::default();

        let rows = match existing {
            None => {
                stats.fresh_start = true;
                let rows = dedup_last(incoming.into_entries());
                stats.added = rows.len();
                rows
            }
            Some(prior) => {
                if prior.kind() != self.kind {
                    warn!(expected = %self.kind, found = %prior.kind(), "Prior table kind differs");
                }
                let known: HashSet<String> =
                    prior.entries().iter().map(|e| e.key.clone()).collect();
                let fetched: HashSet<String> =
                    incoming.entries().iter().map(|e| e.key.clone()).collect();
                stats.replaced = fetched.intersection(&known).count();
                stats.added = fetched.len() - stats.replaced;

                let mut rows = prior.into_entries();
                rows.extend(incoming.into_entries());
                dedup_last(rows)
            }
        };

        let mut table = RankedTable::new(self.kind, rows);
        table.sort_by_count();

        debug!(kind = %self.kind, ?stats, rows = table.len(), "Merged ranked table");
        Merged {
            value: table,
            stats,
        }
    }
}

/// Keeps the last row for every key, in the order those last rows appear.
fn dedup_last(rows: Vec<RankedEntry>) -> Vec<RankedEntry> {
    let last_index: HashMap<&str, usize> = rows
        .iter()
        .enumerate()
        .map(|(i, e)| (e.key.as_str(), i))
        .collect();
    let keep: HashSet<usize> = last_index.into_values().collect();

    rows.into_iter()
        .enumerate()
        .filter(|(i, _)| keep.contains(i))
        .map(|(_, e)| e)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_position_of_last_occurrence() {
        let rows = vec![
            RankedEntry::referrer("a", 1, 1),
            RankedEntry::referrer("b", 2, 1),
            RankedEntry::referrer("a", 3, 1),
        ];
        let kept = dedup_last(rows);
        assert_eq!(
            kept,
            vec![RankedEntry::referrer("b", 2, 1), RankedEntry::referrer("a", 3, 1)]
        );
    }
}
