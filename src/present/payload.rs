use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use crate::metrics::{RankedTable, TimeSeries};

/// Builds the upload document:
///
/// ```json
/// { "<repo>": { "traffic": { "2024-01-01": { "total_views": 3, ... } },
///               "referral_sources": [ ... ], "referral_paths": [ ... ] } }
/// ```
///
/// Traffic is an outer join of views and clones on date; a date missing from
/// one side carries `null` for that side's columns.
pub fn build_payload(
    repository: &str,
    views: &TimeSeries,
    clones: &TimeSeries,
    referral_sources: &RankedTable,
    referral_paths: &RankedTable,
) -> Value {
    let mut traffic: BTreeMap<String, Map<String, Value>> = BTreeMap::new();

    let all_dates = views.iter().chain(clones.iter()).map(|(d, _)| *d);
    for date in all_dates {
        let row = traffic.entry(date.format("%Y-%m-%d").to_string()).or_default();
        for series in [views, clones] {
            let kind = series.kind();
            let (total, unique) = match series.get(&date) {
                Some(c) => (json!(c.total), json!(c.unique)),
                None => (Value::Null, Value::Null),
            };
            row.insert(kind.total_column(), total);
            row.insert(kind.unique_column(), unique);
        }
    }

    json!({
        repository: {
            "traffic": traffic,
            "referral_sources": table_records(referral_sources),
            "referral_paths": table_records(referral_paths),
        }
    })
}

fn table_records(table: &RankedTable) -> Vec<Value> {
    let kind = table.kind();
    table
        .entries()
        .iter()
        .map(|entry| {
            let mut record = Map::new();
            record.insert(kind.natural_key().to_string(), json!(entry.key));
            if kind.has_title() {
                record.insert("title".to_string(), json!(entry.title));
            }
            record.insert("count".to_string(), json!(entry.count));
            record.insert("uniques".to_string(), json!(entry.uniques));
            Value::Object(record)
        })
        .collect()
}
