use crate::errors::DbError;
use crate::types::Record;
use crate::utils::json::document_to_json;
use std::io::{self, BufWriter, Write};
use std::str::FromStr;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum OutputFormat {
    #[default]
    Json,
    Ndjson,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = DbError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "ndjson" | "jsonl" => Ok(Self::Ndjson),
            "csv" => Ok(Self::Csv),
            other => Err(DbError::Config(format!("unknown output format: {other}"))),
        }
    }
}

pub trait RecordSink {
    fn write_record(&mut self, rec: &Record) -> io::Result<()>;
    fn finish(self: Box<Self>) -> io::Result<()>;
}

/// One pretty-printed JSON array.
pub struct JsonArraySink<W: Write> {
    w: BufWriter<W>,
    items: Vec<serde_json::Value>,
}

impl<W: Write> JsonArraySink<W> {
    pub fn new(inner: W) -> Self {
        Self { w: BufWriter::new(inner), items: Vec::new() }
    }
}

impl<W: Write> RecordSink for JsonArraySink<W> {
    fn write_record(&mut self, rec: &Record) -> io::Result<()> {
        self.items.push(document_to_json(rec));
        Ok(())
    }
    fn finish(mut self: Box<Self>) -> io::Result<()> {
        let s = serde_json::to_string_pretty(&self.items)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writeln!(self.w, "{s}")?;
        self.w.flush()
    }
}

pub struct NdjsonSink<W: Write> {
    w: BufWriter<W>,
}

impl<W: Write> NdjsonSink<W> {
    pub fn new(inner: W) -> Self {
        Self { w: BufWriter::new(inner) }
    }
}

impl<W: Write> RecordSink for NdjsonSink<W> {
    fn write_record(&mut self, rec: &Record) -> io::Result<()> {
        let s = serde_json::to_string(&document_to_json(rec))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writeln!(self.w, "{s}")
    }
    fn finish(mut self: Box<Self>) -> io::Result<()> {
        self.w.flush()
    }
}

/// CSV with a fixed header row; fields a record lacks are written empty.
pub struct CsvSink<W: Write> {
    w: csv::Writer<BufWriter<W>>,
    headers: Vec<String>,
    header_written: bool,
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W, headers: Vec<String>) -> Self {
        let w = csv::WriterBuilder::new().from_writer(BufWriter::new(inner));
        Self { w, headers, header_written: false }
    }

    fn write_header(&mut self) -> io::Result<()> {
        if !self.header_written {
            self.w.write_record(&self.headers).map_err(|e| io::Error::other(e.to_string()))?;
            self.header_written = true;
        }
        Ok(())
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn write_record(&mut self, rec: &Record) -> io::Result<()> {
        self.write_header()?;
        let row: Vec<String> =
            self.headers.iter().map(|k| rec.get(k).map(bson_to_string).unwrap_or_default()).collect();
        self.w.write_record(&row).map_err(|e| io::Error::other(e.to_string()))
    }
    fn finish(mut self: Box<Self>) -> io::Result<()> {
        self.write_header()?;
        self.w.flush()
    }
}

/// Union of keys across `records`, in first-seen order.
#[must_use]
pub fn collect_headers(records: &[Record]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for rec in records {
        for k in rec.keys() {
            if !out.iter().any(|h| h == k) {
                out.push(k.clone());
            }
        }
    }
    out
}

fn bson_to_string(v: &bson::Bson) -> String {
    match v {
        bson::Bson::String(s) => s.clone(),
        bson::Bson::Int32(i) => i.to_string(),
        bson::Bson::Int64(i) => i.to_string(),
        bson::Bson::Double(f) => f.to_string(),
        bson::Bson::Boolean(b) => b.to_string(),
        bson::Bson::Null | bson::Bson::Undefined => String::new(),
        other => other.clone().into_relaxed_extjson().to_string(),
    }
}

/// Write `records` to `out` in the requested format.
///
/// # Errors
/// Returns an I/O error from the underlying writer.
pub fn write_records<W: Write>(out: W, records: &[Record], format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Json => drain(JsonArraySink::new(out), records),
        OutputFormat::Ndjson => drain(NdjsonSink::new(out), records),
        OutputFormat::Csv => drain(CsvSink::new(out, collect_headers(records)), records),
    }
}

fn drain<S: RecordSink>(sink: S, records: &[Record]) -> io::Result<()> {
    let mut sink = Box::new(sink);
    for rec in records {
        sink.write_record(rec)?;
    }
    sink.finish()
}
