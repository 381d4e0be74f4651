use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// The native translator cannot express a predicate. Recovered internally by the
    /// fallback path; `find` never returns it.
    #[error("Translation error: {0}")]
    Translation(String),

    /// The row store itself failed. Propagated unchanged, never retried.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Malformed filter: {0}")]
    MalformedFilter(String),

    #[error("Table not found: {0}")]
    NoSuchTable(String),

    #[error("Record has no `{0}` field")]
    MissingId(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("BSON: {0}")]
    Bson(#[from] bson::error::Error),

    #[error("CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

impl From<std::io::Error> for DbError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl DbError {
    /// True for failures that originate in the row store rather than in the filter.
    #[must_use]
    pub const fn is_backend(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_) | Self::NoSuchTable(_))
    }
}
