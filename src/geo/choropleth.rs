//! Choropleth dataset builder
//!
//! Turns a parsed result table into one map dataset per numeric attribute
//! column: resolved location codes, numeric values with a NaN marker for
//! anything non-numeric, hover labels, and a value range computed over
//! finite values only. Output is deterministic: datasets appear in the
//! order columns are first observed, with no randomness and no wall-clock
//! dependency.

use crate::error::{Error, Result};
use crate::geo::states;
use crate::models::record::Record;

/// Recognized aliases for the location column, in priority order.
pub const LOCATION_ALIASES: [&str; 3] = ["State_Name", "state_name", "state"];

/// Min/max over the finite values of one dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

/// One per-attribute geographic map dataset.
///
/// `locations`, `values`, and `labels` are index-aligned, one entry per
/// non-manifest record. `value_range` is `None` when the column has no
/// finite values at all; such a dataset is unrenderable but must not block
/// its siblings.
#[derive(Debug, Clone, PartialEq)]
pub struct MapDataset {
    /// Stable identifier derived from the column name, collision-free
    /// within one build
    pub key: String,
    /// Column name, verbatim
    pub title: String,
    /// Resolved location codes; `""` for unresolvable labels
    pub locations: Vec<String>,
    /// Numeric values; NaN marks non-numeric or missing cells
    pub values: Vec<f64>,
    /// Hover labels, `"<location>: <raw value>"`
    pub labels: Vec<String>,
    pub value_range: Option<ValueRange>,
}

impl MapDataset {
    pub fn is_renderable(&self) -> bool {
        self.value_range.is_some()
    }
}

/// Build one dataset per non-location column.
///
/// The final record is the manifest and is excluded from all aggregation.
/// Fails with [`Error::Schema`] when no recognized location column is
/// present in the first record; an empty input builds an empty output.
pub fn build_datasets(records: &[Record]) -> Result<Vec<MapDataset>> {
    let Some(first) = records.first() else {
        return Ok(Vec::new());
    };

    let location_column = LOCATION_ALIASES
        .iter()
        .find(|alias| first.get(alias).is_some())
        .copied()
        .ok_or_else(|| {
            Error::Schema(format!(
                "no location column among {:?}",
                LOCATION_ALIASES
            ))
        })?;

    // Everything but the manifest row.
    let data_rows = &records[..records.len() - 1];

    let mut datasets = Vec::new();
    let mut used_keys: Vec<String> = Vec::new();

    for column in first.columns().filter(|c| *c != location_column) {
        let mut locations = Vec::with_capacity(data_rows.len());
        let mut values = Vec::with_capacity(data_rows.len());
        let mut labels = Vec::with_capacity(data_rows.len());

        for row in data_rows {
            let location_raw = row
                .get(location_column)
                .map(|cell| cell.display())
                .unwrap_or_default();
            let value_raw = row
                .get(column)
                .map(|cell| cell.display())
                .unwrap_or_default();
            let value = row
                .get(column)
                .map(|cell| cell.as_numeric())
                .unwrap_or(f64::NAN);

            locations.push(states::abbreviation(&location_raw).to_string());
            labels.push(format!("{}: {}", location_raw, value_raw));
            values.push(value);
        }

        datasets.push(MapDataset {
            key: unique_key(column, &mut used_keys),
            title: column.to_string(),
            value_range: finite_range(&values),
            locations,
            values,
            labels,
        });
    }

    Ok(datasets)
}

/// `map-<slug>` identifier, with a numeric suffix when two columns slug to
/// the same text.
fn unique_key(column: &str, used: &mut Vec<String>) -> String {
    let slug: String = column
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    let mut key = format!("map-{}", slug);
    let mut n = 1;
    while used.contains(&key) {
        n += 1;
        key = format!("map-{}-{}", slug, n);
    }
    used.push(key.clone());
    key
}

fn finite_range(values: &[f64]) -> Option<ValueRange> {
    let mut range: Option<ValueRange> = None;
    for &v in values.iter().filter(|v| v.is_finite()) {
        range = Some(match range {
            None => ValueRange { min: v, max: v },
            Some(r) => ValueRange {
                min: r.min.min(v),
                max: r.max.max(v),
            },
        });
    }
    range
}
