//! Tabular result parser
//!
//! The result table endpoint returns delimited text: a header row, one row
//! per resolved location, and one trailing manifest row naming the source
//! files. Parsing is strict and the table must be rectangular. The one
//! leniency is that a final record whose every field is empty (produced by
//! a terminal newline) is dropped; a final record with any content is kept.

use crate::error::{Error, Result};
use crate::models::record::{Cell, Record};

/// Parse a delimited payload into ordered records.
///
/// Header names are taken verbatim (no normalization). Fails with
/// [`Error::Parse`] if the header is empty or any data row has a different
/// field count than the header.
pub fn parse_delimited(text: &str) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| Error::Parse(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(Error::Parse("empty header row".to_string()));
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| Error::Parse(e.to_string()))?;
        if row.len() != headers.len() {
            return Err(Error::Parse(format!(
                "row has {} fields, header has {}",
                row.len(),
                headers.len()
            )));
        }
        let mut record = Record::new();
        for (column, field) in headers.iter().zip(row.iter()) {
            record.push(column.clone(), Cell::Text(field.to_string()));
        }
        records.push(record);
    }

    // Drop the spurious all-empty record a terminal newline can produce,
    // and only that.
    if records.last().is_some_and(Record::is_all_blank) {
        records.pop();
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "State_Name,Population (millions),Median Income (thousands)\n\
                         Texas,29.5,64\n\
                         Vermont,0.64,72\n\
                         File_Name,population.png,income.png\n";

    #[test]
    fn header_defines_keys_verbatim() {
        let records = parse_delimited(TABLE).unwrap();
        assert_eq!(records.len(), 3);
        for record in &records {
            let columns: Vec<&str> = record.columns().collect();
            assert_eq!(
                columns,
                vec![
                    "State_Name",
                    "Population (millions)",
                    "Median Income (thousands)"
                ]
            );
        }
        assert_eq!(
            records[0].get("Population (millions)"),
            Some(&Cell::Text("29.5".to_string()))
        );
    }

    #[test]
    fn trailing_all_empty_record_is_dropped() {
        let records = parse_delimited("a,b\n1,2\n,\n").unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn final_record_with_content_is_kept() {
        let records = parse_delimited("a,b\n1,2\n,x\n").unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn ragged_row_is_a_parse_error() {
        let err = parse_delimited("a,b,c\n1,2\n").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn empty_input_is_a_parse_error() {
        assert!(matches!(parse_delimited(""), Err(Error::Parse(_))));
        assert!(matches!(parse_delimited("\n"), Err(Error::Parse(_))));
    }

    #[test]
    fn header_only_table_yields_no_records() {
        let records = parse_delimited("a,b\n").unwrap();
        assert!(records.is_empty());
    }
}
