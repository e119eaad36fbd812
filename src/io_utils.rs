//! I/O utilities for loading and saving metadata tables.
//!
//! The dtype stages never touch files; everything that does flows through here:
//!
//! - **Delimiter resolution**: extension-based auto-detection (`.tsv` → tab,
//!   anything else → comma) with manual override support.
//! - **Encoding**: input decoding and output transcoding via `encoding_rs`,
//!   defaulting to UTF-8.
//! - **Native storage**: [`read_table`] assigns each column its native type the
//!   way a dataframe reader would: NA tokens become missing cells, a column whose
//!   remaining cells all parse as floats is stored as floats, anything else is
//!   kept as text.
//! - **stdin/stdout**: the `-` path convention routes through standard streams.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};

use crate::{
    data::{Value, parse_float_str},
    table::{Column, Table},
};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

/// Cell spellings loaded as native missing values.
pub const DEFAULT_NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn resolve_output_delimiter(path: Option<&Path>, provided: Option<u8>, fallback: u8) -> u8 {
    if let Some(delim) = provided {
        return delim;
    }
    if let Some(path) = path {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") => return DEFAULT_TSV_DELIMITER,
            Some(ext) if ext.eq_ignore_ascii_case("csv") => return DEFAULT_CSV_DELIMITER,
            _ => {}
        }
    }
    fallback
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false)
        .from_reader(reader)
}

pub fn open_csv_reader_from_path(path: &Path, delimiter: u8) -> Result<csv::Reader<Box<dyn Read>>> {
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    };
    Ok(open_csv_reader(reader, delimiter))
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

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

/// Builds a [`Table`] from a reader whose first record is the header row.
pub fn load_table<R>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
    na_tokens: &[String],
) -> Result<Table>
where
    R: Read,
{
    let headers = decode_record(&reader.byte_headers()?.clone(), encoding)?;
    let mut raw_columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        let decoded = decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {}", row_idx + 2))?;
        for (column, cell) in raw_columns.iter_mut().zip(decoded) {
            column.push(cell);
        }
    }

    let columns = headers
        .into_iter()
        .zip(raw_columns)
        .map(|(name, cells)| Column::new(name, native_values(cells, na_tokens)))
        .collect();
    Table::new(columns).context("Building table from CSV input")
}

pub fn read_table(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
    na_tokens: &[String],
) -> Result<Table> {
    let mut reader = open_csv_reader_from_path(path, delimiter)?;
    load_table(&mut reader, encoding, na_tokens).with_context(|| format!("Loading table {path:?}"))
}

fn native_values(cells: Vec<String>, na_tokens: &[String]) -> Vec<Value> {
    let is_na = |cell: &str| na_tokens.iter().any(|token| token == cell);
    let numeric = cells
        .iter()
        .filter(|cell| !is_na(cell))
        .all(|cell| parse_float_str(cell).is_some());
    cells
        .into_iter()
        .map(|cell| {
            if is_na(&cell) {
                Value::Missing
            } else if numeric {
                match parse_float_str(&cell) {
                    Some(f) if !f.is_nan() => Value::Float(f),
                    _ => Value::Missing,
                }
            } else {
                Value::Text(cell)
            }
        })
        .collect()
}

/// Serializes a table as delimited text. Missing cells are written empty.
pub fn render_table_csv(table: &Table, delimiter: u8) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .double_quote(true)
        .from_writer(Vec::new());
    writer.write_record(table.headers())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|value| match value {
            Value::Missing => String::new(),
            other => other.as_display(),
        }))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow!("Flushing CSV output: {}", err.error()))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

pub fn write_table(
    table: &Table,
    path: Option<&Path>,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<()> {
    let rendered = render_table_csv(table, delimiter)?;
    let (encoded, _, had_errors) = encoding.encode(&rendered);
    if had_errors {
        return Err(anyhow!(
            "Failed to encode output using {}",
            encoding.name()
        ));
    }
    let mut sink: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    };
    sink.write_all(encoded.as_ref())
        .context("Writing table output")?;
    sink.flush().context("Flushing table output")
}
