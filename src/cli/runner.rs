use crate::errors::DbError;
use crate::query::{self, Filter, FindOptions, parse_filter_json, parse_sort_json, telemetry};
use crate::store::MemoryStore;
use std::io::Write;

use super::command::Command;
use super::output::write_records;

fn filter_from(json: Option<&str>) -> Result<Filter, DbError> {
    json.map_or_else(|| Ok(Filter::all()), parse_filter_json)
}

fn options_from(sort_json: Option<&str>, limit: Option<usize>) -> Result<FindOptions, DbError> {
    let sort = sort_json.map(parse_sort_json).transpose()?;
    Ok(FindOptions { sort, limit })
}

/// Execute one command, writing its output to `out`.
///
/// # Errors
/// Returns parse, data file, row store and I/O errors.
pub async fn run<W: Write>(cmd: Command, out: &mut W) -> Result<(), DbError> {
    match cmd {
        Command::Find { data, table, filter_json, sort_json, limit, format } => {
            let store = MemoryStore::from_json_file(&data)?;
            let filter = filter_from(filter_json.as_deref())?;
            let opts = options_from(sort_json.as_deref(), limit)?;
            let rows = query::find(&store, &table, &filter, &opts).await?;
            log::info!("find table={table} returned {} row(s)", rows.len());
            write_records(&mut *out, &rows, format)?;
        }
        Command::Explain { filter_json, sort_json, limit } => {
            let filter = filter_from(filter_json.as_deref())?;
            let opts = options_from(sort_json.as_deref(), limit)?;
            let plan = query::explain(&filter, &opts);
            writeln!(out, "{}", serde_json::to_string_pretty(&plan)?)?;
        }
        Command::Count { data, table, filter_json } => {
            let store = MemoryStore::from_json_file(&data)?;
            let filter = filter_from(filter_json.as_deref())?;
            let n = query::count(&store, &table, &filter).await?;
            writeln!(out, "{n}")?;
        }
        Command::Metrics => {
            write!(out, "{}", telemetry::metrics_text())?;
        }
    }
    Ok(())
}
