//! CSV reading, writing, and encoding helpers.
//!
//! Files handled by the splitter carry no quoting: a cell is everything between
//! two separators. Readers and writers are configured accordingly so a packed
//! cell is passed through byte-for-byte.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};
use log::debug;

pub type Row = Vec<String>;
pub type Table = Vec<Row>;

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

/// Header handling belongs to the discoverer, so every line comes back as a record.
pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(delimiter)
        .quoting(false)
        .flexible(false);
    builder.from_reader(reader)
}

pub fn open_csv_writer<W>(writer: W, delimiter: u8) -> csv::Writer<W>
where
    W: Write,
{
    let mut builder = csv::WriterBuilder::new();
    builder
        .has_headers(false)
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Never);
    builder.from_writer(writer)
}

pub fn create_csv_writer(path: &Path, delimiter: u8) -> Result<csv::Writer<BufWriter<File>>> {
    let file = File::create(path).with_context(|| format!("Creating output file {path:?}"))?;
    Ok(open_csv_writer(BufWriter::new(file), delimiter))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Row> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

/// Reads every record of `reader` into memory.
pub fn read_records<R>(reader: R, delimiter: u8, encoding: &'static Encoding) -> Result<Table>
where
    R: Read,
{
    let mut reader = open_csv_reader(reader, delimiter);
    let mut table = Table::new();
    for (idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", idx + 1))?;
        let decoded =
            decode_record(&record, encoding).with_context(|| format!("Decoding row {}", idx + 1))?;
        table.push(decoded);
    }
    Ok(table)
}

pub fn read_table(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Table> {
    let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
    let table = read_records(BufReader::new(file), delimiter, encoding)
        .with_context(|| format!("Reading {path:?}"))?;
    debug!("Loaded {} row(s) from {:?}", table.len(), path);
    Ok(table)
}
