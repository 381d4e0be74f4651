use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Which execution path served a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPath {
    Native,
    Fallback,
}

impl QueryPath {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub slow_query_ms: u64,
    pub query_log_path: Option<PathBuf>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        let slow = std::env::var("ROWBRIDGE_SLOW_QUERY_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(500);
        Self { slow_query_ms: slow, query_log_path: None }
    }
}

#[derive(Default)]
pub struct Metrics {
    pub queries_total: AtomicU64,
    pub native_total: AtomicU64,
    pub fallback_total: AtomicU64,
    pub translation_fallbacks_total: AtomicU64,
    pub backend_errors_total: AtomicU64,
    pub slow_queries_total: AtomicU64,
}

#[derive(Default)]
pub struct Telemetry {
    pub cfg: RwLock<TelemetryConfig>,
    pub metrics: Metrics,
    // For tests we can capture query lines in-memory
    query_sink: RwLock<Option<Arc<RwLock<Vec<String>>>>>,
}

pub(crate) static TELEMETRY: std::sync::LazyLock<Telemetry> =
    std::sync::LazyLock::new(Telemetry::default);

pub fn set_query_log(path: PathBuf, slow_query_ms: Option<u64>) {
    let mut w = TELEMETRY.cfg.write();
    w.query_log_path = Some(path);
    if let Some(ms) = slow_query_ms {
        w.slow_query_ms = ms;
    }
}

pub fn set_slow_query_ms(ms: u64) {
    TELEMETRY.cfg.write().slow_query_ms = ms;
}

pub fn set_query_sink_for_tests(sink: Arc<RwLock<Vec<String>>>) {
    *TELEMETRY.query_sink.write() = Some(sink);
}

fn write_line(path: &PathBuf, line: &str) {
    if let Ok(mut f) = std::fs::OpenOptions::new().create(true).append(true).open(path) {
        use std::io::Write;
        let _ = writeln!(f, "{line}");
    }
}

fn now_ts() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Hash of the filter's debug form, so query logs never carry filter values.
#[must_use]
pub fn filter_hash(filter_dbg: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut h = Sha256::new();
    h.update(filter_dbg.as_bytes());
    hex::encode(h.finalize())
}

/// Count a fallback caused by a translation failure rather than by `$or`.
pub fn record_translation_fallback(table: &str, reason: &str) {
    TELEMETRY.metrics.translation_fallbacks_total.fetch_add(1, Ordering::Relaxed);
    log::debug!("table={table} native translation declined: {reason}");
}

pub fn record_backend_error(table: &str, err: &crate::errors::DbError) {
    TELEMETRY.metrics.backend_errors_total.fetch_add(1, Ordering::Relaxed);
    log::warn!("table={table} row store error: {err}");
}

pub fn log_query(table: &str, filter_dbg: &str, path: QueryPath, duration_ms: u128, rows: usize) {
    let m = &TELEMETRY.metrics;
    m.queries_total.fetch_add(1, Ordering::Relaxed);
    match path {
        QueryPath::Native => m.native_total.fetch_add(1, Ordering::Relaxed),
        QueryPath::Fallback => m.fallback_total.fetch_add(1, Ordering::Relaxed),
    };
    let cfg = TELEMETRY.cfg.read().clone();
    let slow = u64::try_from(duration_ms).map_or(true, |ms| ms >= cfg.slow_query_ms);
    if slow {
        m.slow_queries_total.fetch_add(1, Ordering::Relaxed);
        log::warn!(target: "rowbridge::metrics", "slow query table={table} path={} duration_ms={duration_ms}", path.as_str());
    }
    let line = serde_json::json!({
        "ts": now_ts(),
        "table": table,
        "filter_hash": filter_hash(filter_dbg),
        "path": path.as_str(),
        "duration_ms": u64::try_from(duration_ms).unwrap_or(u64::MAX),
        "rows": rows,
        "slow": slow
    })
    .to_string();
    let sink = TELEMETRY.query_sink.read().clone();
    if let Some(sink) = sink {
        sink.write().push(line.clone());
    }
    if let Some(path) = cfg.query_log_path.as_ref() {
        write_line(path, &line);
    }
}

#[must_use]
pub fn metrics_text() -> String {
    // OpenMetrics/Prometheus exposition format (no types/HELP for brevity)
    let m = &TELEMETRY.metrics;
    format!(
        "rowbridge_queries_total {}\n\
         rowbridge_native_total {}\n\
         rowbridge_fallback_total {}\n\
         rowbridge_translation_fallbacks_total {}\n\
         rowbridge_backend_errors_total {}\n\
         rowbridge_slow_queries_total {}\n",
        m.queries_total.load(Ordering::Relaxed),
        m.native_total.load(Ordering::Relaxed),
        m.fallback_total.load(Ordering::Relaxed),
        m.translation_fallbacks_total.load(Ordering::Relaxed),
        m.backend_errors_total.load(Ordering::Relaxed),
        m.slow_queries_total.load(Ordering::Relaxed),
    )
}
