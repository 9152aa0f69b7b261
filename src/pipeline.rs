//! Per-file split pipeline.
//!
//! Each file is read fully, its extended header discovered, and then a producer
//! thread (the [`RowExpander`]) feeds a consumer thread (the [`RowSink`]) through
//! a bounded channel. Files are processed one after another.

use std::{
    path::{Path, PathBuf},
    sync::mpsc::sync_channel,
    thread,
};

use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};

use crate::{
    candidates::{find_candidates, output_path_for},
    config::Settings,
    error::SplitError,
    expand::RowExpander,
    header::discover_header,
    io_utils::{self, Row},
    printable_delimiter,
    sink::RowSink,
};

/// Rows in flight between the expander and the sink.
pub const CHANNEL_BOUND: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub rows_written: usize,
    pub sub_columns: Vec<String>,
}

/// Splits every candidate file, or only the first one when `first_only` is set.
pub fn run_split(settings: &Settings, first_only: bool) -> Result<Vec<SplitReport>> {
    let mut files = find_candidates(
        &settings.work_dir,
        &settings.source_pattern,
        &settings.result_suffix,
    )?;
    if first_only && files.len() > 1 {
        info!("Processing only {:?}; {} file(s) left untouched", files[0], files.len() - 1);
        files.truncate(1);
    }

    let mut reports = Vec::with_capacity(files.len());
    for input in &files {
        let output = output_path_for(input, &settings.result_suffix);
        let report = split_file(input, &output, settings)
            .with_context(|| format!("Splitting {input:?}"))?;
        info!(
            "✓ {:?} -> {:?} ({} row(s), {} new column(s))",
            report.input,
            report.output,
            report.rows_written,
            report.sub_columns.len()
        );
        reports.push(report);
    }
    Ok(reports)
}

pub fn split_file(input: &Path, output: &Path, settings: &Settings) -> Result<SplitReport> {
    info!(
        "Reading '{}' (separator '{}', target column {})",
        input.display(),
        printable_delimiter(settings.delimiter),
        settings.cell.target_column + 1
    );
    let table = io_utils::read_table(input, settings.delimiter, settings.encoding)?;
    let header = discover_header(&table, settings.has_headers, &settings.cell)?;
    info!("Appending sub-columns: {}", header.sub_columns().join(" "));

    let sink = RowSink::create(output, settings.delimiter)?;
    let rows_written = run_stages(table, sink, |rows| {
        RowExpander::new(rows, &header, &settings.cell, settings.has_headers)
    })?;

    Ok(SplitReport {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        rows_written,
        sub_columns: header.sub_columns().to_vec(),
    })
}

/// Runs producer and consumer concurrently and waits for both.
///
/// The producer owns the only sender, so the channel closes once it returns.
/// If the sink fails it drops the receiver; the producer's next send then
/// fails and it stops early. The error reports how many rows never made it
/// through a successful flush.
pub fn run_stages<W, F, E>(table: Vec<Row>, mut sink: RowSink<W>, expand: F) -> Result<usize>
where
    W: std::io::Write + Send,
    F: FnOnce(std::vec::IntoIter<Row>) -> E + Send,
    E: Iterator<Item = Row>,
{
    let total = table.len();
    let (tx, rx) = sync_channel::<Row>(CHANNEL_BOUND);

    let (sent, sink_result) = thread::scope(|scope| {
        let producer = scope.spawn(move || {
            let mut sent = 0usize;
            for row in expand(table.into_iter()) {
                if tx.send(row).is_err() {
                    warn!("Sink closed early; stopping after {sent} row(s)");
                    break;
                }
                sent += 1;
            }
            debug!("Producer finished after {sent} row(s)");
            sent
        });
        let consumer = scope.spawn(move || {
            let result = sink.drain(rx);
            (result, sink.persisted())
        });

        let sent = producer.join().map_err(|_| anyhow!("Row expander panicked"));
        let sink_result = consumer.join().map_err(|_| anyhow!("Row sink panicked"));
        (sent, sink_result)
    });

    let sent = sent?;
    let (result, persisted) = sink_result?;
    match result {
        Ok(rows) => {
            debug!("{sent} row(s) sent, {rows} written");
            Ok(rows)
        }
        Err(err) => Err(err.context(SplitError::SinkFailed {
            undelivered: total - persisted,
        })),
    }
}
