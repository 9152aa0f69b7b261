//! Decoding of packed key-value cells.
//!
//! A packed cell looks like `part0@part1&part0@part1&...` where the sub-column
//! and key-value delimiters come from [`CellEncoding`]. Segments without a
//! key-value delimiter are skipped rather than reported.

use std::collections::HashMap;

use log::{debug, trace};

use crate::config::CellEncoding;

/// Key-value pairs found in one packed cell, borrowing from the row.
pub type SubFields<'a> = HashMap<&'a str, &'a str>;

/// Decodes the target cell of `row`.
///
/// A cell without the sub-column delimiter holds no sub-fields, even if it
/// happens to contain a key-value delimiter. When a key repeats inside one
/// cell the later value wins. A row too narrow to hold the target column has
/// no sub-fields.
pub fn parse_sub_fields<'a>(row: &'a [String], encoding: &CellEncoding) -> SubFields<'a> {
    match row.get(encoding.target_column) {
        Some(cell) => parse_cell(cell, encoding),
        None => SubFields::new(),
    }
}

pub fn parse_cell<'a>(cell: &'a str, encoding: &CellEncoding) -> SubFields<'a> {
    let mut fields = SubFields::new();
    if !cell.contains(encoding.subcol_delimiter.as_str()) {
        return fields;
    }
    let key_index = encoding.key_position.key_index();
    let value_index = encoding.key_position.value_index();
    for segment in cell.split(encoding.subcol_delimiter.as_str()) {
        let parts = segment
            .split(encoding.keyvalue_delimiter.as_str())
            .collect::<Vec<_>>();
        if parts.len() < 2 {
            trace!("Skipping segment without key-value pair: {segment:?}");
            continue;
        }
        let key = parts[key_index];
        if let Some(previous) = fields.insert(key, parts[value_index]) {
            debug!("Sub-column '{key}' repeated in one cell; dropping earlier value {previous:?}");
        }
    }
    fields
}
