//! Tabular row model
//!
//! The remote pipeline emits a generic table whose column set is not known
//! statically: exactly one location column plus zero or more numeric
//! attribute columns. Rows arrive in two encodings, delimited text on the
//! rehydration path and a JSON array of objects on the push channel; both
//! are normalized into [`Record`].

use serde_json::{Map, Value};

/// A single raw scalar cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Missing,
}

impl Cell {
    /// Numeric view of the cell. Non-numeric and missing cells coerce to the
    /// NaN marker rather than an error; the dataset builder relies on this.
    pub fn as_numeric(&self) -> f64 {
        match self {
            Cell::Number(n) => *n,
            Cell::Text(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
            Cell::Missing => f64::NAN,
        }
    }

    /// Raw display form, used verbatim in hover labels.
    pub fn display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::Missing => String::new(),
        }
    }

    /// True for cells that carry no content at all.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Missing => true,
            Cell::Text(s) => s.is_empty(),
            Cell::Number(_) => false,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// An ordered mapping of column name to raw cell.
///
/// Column order is significant: the dataset builder emits one map per
/// attribute column in the order columns first appear.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, Cell)>,
}

impl Record {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn push(&mut self, column: impl Into<String>, cell: Cell) {
        self.fields.push((column.into(), cell));
    }

    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, cell)| cell)
    }

    /// Column names in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Cells in declaration order.
    pub fn values(&self) -> impl Iterator<Item = &Cell> {
        self.fields.iter().map(|(_, cell)| cell)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when every cell is blank, the shape of the spurious record a
    /// terminal newline produces in delimited input.
    pub fn is_all_blank(&self) -> bool {
        !self.fields.is_empty() && self.values().all(Cell::is_blank)
    }

    /// Build a record from a pushed JSON object.
    ///
    /// Insertion order of the map is preserved (serde_json `preserve_order`),
    /// so column order matches what the server emitted.
    pub fn from_json_object(obj: &Map<String, Value>) -> Self {
        let mut record = Record::new();
        for (column, value) in obj {
            let cell = match value {
                Value::Null => Cell::Missing,
                Value::Number(n) => Cell::Number(n.as_f64().unwrap_or(f64::NAN)),
                Value::String(s) => Cell::Text(s.clone()),
                Value::Bool(b) => Cell::Text(b.to_string()),
                other => Cell::Text(other.to_string()),
            };
            record.push(column.clone(), cell);
        }
        record
    }
}

/// Extract the ordered original file names from a result set's manifest
/// record (the synthetic last row).
///
/// The manifest's first field holds a non-filename marker and is always
/// skipped; blank cells are skipped as unusable names. Returns an empty list
/// for an empty result set.
pub fn manifest_file_names(records: &[Record]) -> Vec<String> {
    let Some(manifest) = records.last() else {
        return Vec::new();
    };
    manifest
        .values()
        .skip(1)
        .filter(|cell| !cell.is_blank())
        .map(Cell::display)
        .collect()
}
