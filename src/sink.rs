use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use log::{debug, info};

use crate::io_utils::{self, Row};

/// Rows buffered between two flushes of the underlying writer.
pub const FLUSH_EVERY: usize = 256;

/// Writes expanded rows with the same separator as the source file.
///
/// `written` counts rows handed to the CSV writer; `persisted` only counts rows
/// that made it through a successful flush.
pub struct RowSink<W: Write> {
    writer: csv::Writer<W>,
    written: usize,
    persisted: usize,
}

impl RowSink<BufWriter<File>> {
    /// Creates or truncates `path`. Nothing is cleaned up if a later write fails.
    pub fn create(path: &Path, delimiter: u8) -> Result<Self> {
        info!("Writing output to {path:?}");
        Ok(Self::new(io_utils::create_csv_writer(path, delimiter)?))
    }
}

impl<W: Write> RowSink<W> {
    pub fn new(writer: csv::Writer<W>) -> Self {
        Self {
            writer,
            written: 0,
            persisted: 0,
        }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn persisted(&self) -> usize {
        self.persisted
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Flushing output writer")?;
        self.persisted = self.written;
        Ok(())
    }

    /// Writes rows until the source runs dry, flushing every [`FLUSH_EVERY`]
    /// rows and once more at the end. Returns the number of persisted rows.
    ///
    /// Stops at the first failed write or flush; rows not yet pulled from
    /// `rows` are dropped along with it.
    pub fn drain<I>(&mut self, rows: I) -> Result<usize>
    where
        I: IntoIterator<Item = Row>,
    {
        for row in rows {
            self.writer
                .write_record(&row)
                .with_context(|| format!("Writing output row {}", self.written + 1))?;
            self.written += 1;
            if self.written % FLUSH_EVERY == 0 {
                self.flush()?;
            }
        }
        self.flush()?;
        debug!("Sink flushed after {} row(s)", self.persisted);
        Ok(self.persisted)
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|err| anyhow::anyhow!("Flushing output writer: {}", err.error()))
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    struct FailingWriter {
        accepted: usize,
    }

    impl Write for FailingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.accepted == 0 {
                return Err(io::Error::other("disk full"));
            }
            self.accepted -= 1;
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn drain_writes_rows_in_order_and_flushes() {
        let mut sink = RowSink::new(io_utils::open_csv_writer(Vec::new(), b';'));
        let written = sink
            .drain(vec![row(&["id", "a"]), row(&["1", "x"]), row(&["2", ""])])
            .expect("drain");
        assert_eq!(written, 3);
        let bytes = sink.into_inner().expect("inner");
        assert_eq!(String::from_utf8(bytes).unwrap(), "id;a\n1;x\n2;\n");
    }

    #[test]
    fn write_failure_stops_the_sink() {
        let writer = csv::WriterBuilder::new()
            .buffer_capacity(1)
            .from_writer(FailingWriter { accepted: 0 });
        let mut sink = RowSink::new(writer);
        let err = sink
            .drain(vec![row(&["1", "abc"]), row(&["2", "def"])])
            .unwrap_err();
        assert!(format!("{err:#}").contains("disk full"));
        assert_eq!(sink.written(), 0);
        assert_eq!(sink.persisted(), 0);
    }

    #[test]
    fn rows_stuck_in_the_buffer_are_not_counted_as_persisted() {
        let mut sink = RowSink::new(io_utils::open_csv_writer(
            FailingWriter { accepted: 0 },
            b';',
        ));
        let rows = (0..10).map(|idx| row(&[&idx.to_string(), "k@v&"]));
        let err = sink.drain(rows).unwrap_err();
        assert!(format!("{err:#}").contains("Flushing output writer"));
        assert_eq!(sink.written(), 10);
        assert_eq!(sink.persisted(), 0);
    }

    #[test]
    fn periodic_flushes_advance_the_persisted_count() {
        // Enough room for the first batch of rows, not for the second.
        let mut sink = RowSink::new(
            csv::WriterBuilder::new()
                .buffer_capacity(1 << 16)
                .from_writer(FailingWriter { accepted: 1 }),
        );
        let rows = (0..FLUSH_EVERY + 10).map(|idx| row(&[&idx.to_string(), "v"]));
        sink.drain(rows).unwrap_err();
        assert_eq!(sink.persisted(), FLUSH_EVERY);
        assert_eq!(sink.written(), FLUSH_EVERY + 10);
    }
}
