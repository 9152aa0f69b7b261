//! Fatal configuration failures raised by the splitter.
//!
//! I/O problems travel as plain [`anyhow::Error`] values with context attached
//! at the call site; the variants here cover the cases where the input or the
//! settings make a split impossible.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SplitError {
    #[error("Key position {0} is not in range [0 - 1]")]
    InvalidKeyPosition(i64),
    #[error("Target column must be 1 or greater (got {0})")]
    InvalidTargetColumn(i64),
    #[error(
        "Row {row} has {columns} column(s) but the target column position is {target}"
    )]
    TargetColumnOutOfRange {
        row: usize,
        columns: usize,
        target: usize,
    },
    #[error("Nothing to split in the target column")]
    NothingToSplit,
    #[error("No input files matched '{0}'")]
    NoInputFiles(String),
    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: &'static str, reason: String },
    #[error("Writing output failed; {undelivered} expanded row(s) were not written")]
    SinkFailed { undelivered: usize },
}
