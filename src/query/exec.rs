use crate::errors::DbError;
use crate::store::RowStore;
use crate::types::Record;
use serde::Serialize;
use std::time::Instant;

use super::eval::CompiledFilter;
use super::parse::{parse_filter_json, parse_find_options_json};
use super::shape::shape_with;
use super::telemetry::{self, QueryPath};
use super::translate::{NativeQuery, translate};
use super::types::{Filter, FindOptions};

/// How a filter would be executed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum QueryPlan {
    Native { query: NativeQuery },
    Fallback { reason: String },
}

/// Decide the execution path without touching the store.
#[must_use]
pub fn explain(filter: &Filter, opts: &FindOptions) -> QueryPlan {
    match translate(filter, opts) {
        Ok(query) => QueryPlan::Native { query },
        Err(e) => QueryPlan::Fallback { reason: e.to_string() },
    }
}

/// Run `filter` against `table`: natively when the filter translates, otherwise by
/// scanning the whole table in memory. Both paths return rows sorted by
/// `opts.sort` (default `created_at` descending) and then truncated to `opts.limit`.
///
/// # Errors
/// Row store failures are returned unchanged. A regex that does not compile on the
/// fallback path is `MalformedFilter`. Translation failures never escape.
pub async fn find<S: RowStore>(
    store: &S,
    table: &str,
    filter: &Filter,
    opts: &FindOptions,
) -> Result<Vec<Record>, DbError> {
    let start = Instant::now();
    let (rows, path) = match translate(filter, opts) {
        Ok(native) => {
            let rows = store
                .select(table, &native)
                .await
                .inspect_err(|e| telemetry::record_backend_error(table, e))?;
            (shape_with(rows, opts), QueryPath::Native)
        }
        Err(DbError::Translation(reason)) => {
            if !filter.has_or() {
                telemetry::record_translation_fallback(table, &reason);
            }
            (find_fallback(store, table, filter, opts).await?, QueryPath::Fallback)
        }
        Err(e) => return Err(e),
    };
    let dur_ms = start.elapsed().as_millis();
    crate::dev6!(
        "{{\"bench\":\"query\",\"op\":\"find\",\"table\":\"{}\",\"path\":\"{}\",\"duration_ms\":{},\"result_count\":{},\"limit\":{}}}",
        table,
        path.as_str(),
        crate::utils::num::u128_to_u64_saturating(dur_ms),
        crate::utils::num::usize_to_u64(rows.len()),
        crate::utils::num::usize_to_u64(opts.effective_limit().unwrap_or(0))
    );
    telemetry::log_query(table, &format!("{filter:?}"), path, dur_ms, rows.len());
    Ok(rows)
}

/// The fallback path on its own: full fetch, in-memory filter, shape.
///
/// # Errors
/// Returns `MalformedFilter` for an uncompilable regex (checked before the fetch) and
/// row store failures unchanged.
pub async fn find_fallback<S: RowStore>(
    store: &S,
    table: &str,
    filter: &Filter,
    opts: &FindOptions,
) -> Result<Vec<Record>, DbError> {
    let compiled = CompiledFilter::new(filter)?;
    let all = store
        .fetch_all(table)
        .await
        .inspect_err(|e| telemetry::record_backend_error(table, e))?;
    log::debug!("table={table} fallback scan over {} row(s)", all.len());
    Ok(shape_with(compiled.apply(all), opts))
}

/// First row of `find` with the same sort and a limit of one.
///
/// # Errors
/// Same as `find`.
pub async fn find_one<S: RowStore>(
    store: &S,
    table: &str,
    filter: &Filter,
    opts: &FindOptions,
) -> Result<Option<Record>, DbError> {
    let opts = opts.clone().with_limit(1);
    Ok(find(store, table, filter, &opts).await?.into_iter().next())
}

/// Number of rows matching `filter`.
///
/// # Errors
/// Same as `find`.
pub async fn count<S: RowStore>(store: &S, table: &str, filter: &Filter) -> Result<usize, DbError> {
    Ok(find(store, table, filter, &FindOptions::default()).await?.len())
}

/// `find` with the filter and options given as JSON text (`options_json` holds
/// `{ "sort": {...}, "limit": N }`).
///
/// # Errors
/// Parse errors plus everything `find` returns.
pub async fn find_json<S: RowStore>(
    store: &S,
    table: &str,
    filter_json: &str,
    options_json: Option<&str>,
) -> Result<Vec<Record>, DbError> {
    let filter = parse_filter_json(filter_json)?;
    let opts = match options_json {
        Some(s) => parse_find_options_json(s)?,
        None => FindOptions::default(),
    };
    find(store, table, &filter, &opts).await
}
