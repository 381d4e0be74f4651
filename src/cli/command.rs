use super::output::OutputFormat;
use std::path::PathBuf;

/// Programmatic form of the CLI subcommands. Filters, sorts and options are JSON text.
#[derive(Debug, Clone)]
pub enum Command {
    Find {
        data: PathBuf,
        table: String,
        filter_json: Option<String>,
        sort_json: Option<String>,
        limit: Option<usize>,
        format: OutputFormat,
    },
    Explain {
        filter_json: Option<String>,
        sort_json: Option<String>,
        limit: Option<usize>,
    },
    Count {
        data: PathBuf,
        table: String,
        filter_json: Option<String>,
    },
    Metrics,
}
