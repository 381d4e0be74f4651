mod command;
mod output;
mod runner;

pub use command::Command;
pub use output::{CsvSink, JsonArraySink, NdjsonSink, OutputFormat, RecordSink, collect_headers, write_records};
pub use runner::run;
