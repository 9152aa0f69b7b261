//! Extended header discovery.
//!
//! The first pass over a table collects every distinct sub-key found in the
//! packed column. Sub-keys are appended after the original columns in
//! ascending byte order, so two scans of the same input always agree.

use std::collections::BTreeSet;

use log::{debug, info};

use crate::{
    config::CellEncoding,
    encoded::parse_sub_fields,
    error::SplitError,
    io_utils::Row,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedHeader {
    columns: Vec<String>,
    main_count: usize,
}

impl ExtendedHeader {
    pub fn new(main: Vec<String>, sub_columns: impl IntoIterator<Item = String>) -> Self {
        let main_count = main.len();
        let mut columns = main;
        columns.extend(sub_columns);
        Self {
            columns,
            main_count,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn main_count(&self) -> usize {
        self.main_count
    }

    pub fn main_columns(&self) -> &[String] {
        &self.columns[..self.main_count]
    }

    pub fn sub_columns(&self) -> &[String] {
        &self.columns[self.main_count..]
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Scans `table` and builds its extended header.
///
/// With `has_headers` the first row supplies the main column names and is not
/// scanned. Without it every row is scanned and the main columns get synthetic
/// `column_N` names sized to the first row. Every row must reach the target
/// column, and at least one sub-key must turn up.
pub fn discover_header(
    table: &[Row],
    has_headers: bool,
    encoding: &CellEncoding,
) -> Result<ExtendedHeader, SplitError> {
    let main = match (has_headers, table.first()) {
        (true, Some(first)) => first.clone(),
        (false, Some(first)) => synthetic_headers(first.len()),
        (_, None) => Vec::new(),
    };
    info!("Main header has {} column(s)", main.len());

    let skip = usize::from(has_headers);
    let mut sub_keys = BTreeSet::new();
    for (idx, row) in table.iter().enumerate() {
        ensure_target_in_range(row, idx + 1, encoding)?;
        if idx < skip {
            continue;
        }
        for key in parse_sub_fields(row, encoding).into_keys() {
            if !sub_keys.contains(key) {
                debug!("New sub-column '{key}' found in row {}", idx + 1);
                sub_keys.insert(key.to_string());
            }
        }
    }

    info!(
        "Scanned {} row(s); {} sub-column(s) discovered",
        table.len(),
        sub_keys.len()
    );
    if sub_keys.is_empty() {
        return Err(SplitError::NothingToSplit);
    }
    Ok(ExtendedHeader::new(main, sub_keys))
}

fn ensure_target_in_range(
    row: &Row,
    row_number: usize,
    encoding: &CellEncoding,
) -> Result<(), SplitError> {
    if row.len() <= encoding.target_column {
        return Err(SplitError::TargetColumnOutOfRange {
            row: row_number,
            columns: row.len(),
            target: encoding.target_column + 1,
        });
    }
    Ok(())
}

fn synthetic_headers(count: usize) -> Vec<String> {
    (1..=count).map(|idx| format!("column_{idx}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeyPosition;

    fn encoding() -> CellEncoding {
        CellEncoding {
            target_column: 1,
            subcol_delimiter: "&".to_string(),
            keyvalue_delimiter: "@".to_string(),
            key_position: KeyPosition::First,
        }
    }

    fn table(rows: &[&str]) -> Vec<Row> {
        rows.iter()
            .map(|line| line.split(';').map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn sub_keys_are_sorted_after_main_columns() {
        let rows = table(&["id;info", "1;c@z&a@x", "2;b@y&a@w"]);
        let header = discover_header(&rows, true, &encoding()).expect("discover");
        assert_eq!(header.columns(), ["id", "info", "a", "b", "c"]);
        assert_eq!(header.main_count(), 2);
        assert_eq!(header.sub_columns(), ["a", "b", "c"]);
    }

    #[test]
    fn header_row_is_not_scanned_for_sub_keys() {
        let rows = table(&["id;h@1&g@2", "1;a@x&b@y"]);
        let header = discover_header(&rows, true, &encoding()).expect("discover");
        assert_eq!(header.sub_columns(), ["a", "b"]);
    }

    #[test]
    fn headerless_tables_scan_every_row() {
        let rows = table(&["1;a@x&b@y", "2;c@z&"]);
        let header = discover_header(&rows, false, &encoding()).expect("discover");
        assert_eq!(header.main_columns(), ["column_1", "column_2"]);
        assert_eq!(header.sub_columns(), ["a", "b", "c"]);
    }

    #[test]
    fn narrow_row_is_a_configuration_error() {
        let rows = table(&["id", "1"]);
        let err = discover_header(&rows, true, &encoding()).unwrap_err();
        assert_eq!(
            err,
            SplitError::TargetColumnOutOfRange {
                row: 1,
                columns: 1,
                target: 2
            }
        );
    }

    #[test]
    fn no_sub_keys_means_nothing_to_split() {
        let rows = table(&["id;info", "1;plain", "2;c@z"]);
        let err = discover_header(&rows, true, &encoding()).unwrap_err();
        assert_eq!(err, SplitError::NothingToSplit);
    }

    #[test]
    fn empty_table_has_nothing_to_split() {
        let err = discover_header(&[], true, &encoding()).unwrap_err();
        assert_eq!(err, SplitError::NothingToSplit);
    }
}
