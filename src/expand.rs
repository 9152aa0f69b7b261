//! Second pass: widening every row to the extended header.

use itertools::Itertools;
use log::{debug, trace};

use crate::{
    config::CellEncoding,
    encoded::parse_cell,
    header::ExtendedHeader,
    io_utils::Row,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExpandState {
    Header,
    Data,
}

/// Lazily expands the rows of a rectangular table.
///
/// When the table has a header row it is replaced by the extended header. Each
/// data row gets exactly one extra cell per sub-column, in header order, holding
/// the decoded value or an empty string. A row too narrow to hold the target
/// column is padded with empty cells.
pub struct RowExpander<'a, I> {
    rows: I,
    header: &'a ExtendedHeader,
    encoding: &'a CellEncoding,
    state: ExpandState,
    emitted: usize,
}

impl<'a, I> RowExpander<'a, I>
where
    I: Iterator<Item = Row>,
{
    pub fn new(
        rows: impl IntoIterator<IntoIter = I>,
        header: &'a ExtendedHeader,
        encoding: &'a CellEncoding,
        has_headers: bool,
    ) -> Self {
        let state = if has_headers {
            ExpandState::Header
        } else {
            ExpandState::Data
        };
        Self {
            rows: rows.into_iter(),
            header,
            encoding,
            state,
            emitted: 0,
        }
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }

    fn expand_row(&self, mut row: Row) -> Row {
        let Some(cell) = row.get(self.encoding.target_column).cloned() else {
            row.extend(self.header.sub_columns().iter().map(|_| String::new()));
            return row;
        };
        let fields = parse_cell(&cell, self.encoding);
        row.extend(self.header.sub_columns().iter().map(|sub| {
            fields
                .get(sub.as_str())
                .map(|value| value.to_string())
                .unwrap_or_default()
        }));
        row
    }
}

impl<I> Iterator for RowExpander<'_, I>
where
    I: Iterator<Item = Row>,
{
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        let row = self.rows.next()?;
        let expanded = match self.state {
            ExpandState::Header => {
                debug!("Emitting extended header ({} column(s))", self.header.len());
                self.state = ExpandState::Data;
                self.header.columns().to_vec()
            }
            ExpandState::Data => self.expand_row(row),
        };
        self.emitted += 1;
        trace!("Row {}: {}", self.emitted, expanded.iter().join("|"));
        Some(expanded)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

/// Convenience wrapper used where the whole expanded table is wanted at once.
pub fn expand_table(
    table: Vec<Row>,
    header: &ExtendedHeader,
    encoding: &CellEncoding,
    has_headers: bool,
) -> Vec<Row> {
    RowExpander::new(table, header, encoding, has_headers).collect()
}
