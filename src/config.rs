//! Adapter configuration: which backend, how to reach it, and logging knobs.
//!
//! Precedence: explicit values > environment > config files > defaults.
//! Config files are read from an explicit path, `ROWBRIDGE_CONFIG`, `./rowbridge.toml`
//! and `<config dir>/rowbridge.toml`; the first file that sets a key wins.

use crate::errors::DbError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    Mongodb,
    #[default]
    Supabase,
    Postgresql,
    Mysql,
    Sqlite,
    Firestore,
}

impl DatabaseType {
    /// Name of the primary-key field for this backend.
    #[must_use]
    pub const fn id_field(self) -> &'static str {
        match self {
            Self::Mongodb => "_id",
            _ => "id",
        }
    }

    /// Parse leniently: unknown names fall back to Supabase with a warning.
    #[must_use]
    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| {
            log::warn!("database type \"{s}\" not implemented, defaulting to supabase");
            Self::Supabase
        })
    }
}

impl FromStr for DatabaseType {
    type Err = DbError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "mongodb" => Self::Mongodb,
            "supabase" => Self::Supabase,
            "postgresql" => Self::Postgresql,
            "mysql" => Self::Mysql,
            "sqlite" => Self::Sqlite,
            "firestore" => Self::Firestore,
            other => return Err(DbError::Config(format!("unknown database type: {other}"))),
        })
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Mongodb => "mongodb",
            Self::Supabase => "supabase",
            Self::Postgresql => "postgresql",
            Self::Mysql => "mysql",
            Self::Sqlite => "sqlite",
            Self::Firestore => "firestore",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterConfig {
    pub database_type: Option<DatabaseType>,
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub id_field: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub slow_query_ms: Option<u64>,
}

impl AdapterConfig {
    #[must_use]
    pub fn database_type(&self) -> DatabaseType {
        self.database_type.unwrap_or_default()
    }

    /// Configured id field, or the backend's default.
    #[must_use]
    pub fn id_field(&self) -> String {
        self.id_field.clone().unwrap_or_else(|| self.database_type().id_field().to_string())
    }

    /// Fill every unset key from `other`.
    fn merge_missing(&mut self, other: Self) {
        if self.database_type.is_none() {
            self.database_type = other.database_type;
        }
        if self.url.is_none() {
            self.url = other.url;
        }
        if self.api_key.is_none() {
            self.api_key = other.api_key;
        }
        if self.id_field.is_none() {
            self.id_field = other.id_field;
        }
        if self.log_dir.is_none() {
            self.log_dir = other.log_dir;
        }
        if self.log_level.is_none() {
            self.log_level = other.log_level;
        }
        if self.slow_query_ms.is_none() {
            self.slow_query_ms = other.slow_query_ms;
        }
    }

    /// Read settings from an environment lookup (`std::env::var` in production).
    #[must_use]
    pub fn from_env_with(get: impl Fn(&str) -> Option<String>) -> Self {
        let url = get("SUPABASE_URL").or_else(|| get("MONGO_URL")).or_else(|| get("DATABASE_URL"));
        Self {
            database_type: get("DATABASE_TYPE").map(|s| DatabaseType::parse_or_default(&s)),
            url,
            api_key: get("SUPABASE_ANON_KEY"),
            id_field: get("ROWBRIDGE_ID_FIELD"),
            log_dir: get("ROWBRIDGE_LOG_DIR").map(PathBuf::from),
            log_level: get("ROWBRIDGE_LOG_LEVEL"),
            slow_query_ms: get("ROWBRIDGE_SLOW_QUERY_MS").and_then(|s| s.parse().ok()),
        }
    }

    /// # Errors
    /// Returns an error if the file cannot be read or is not valid TOML for this shape.
    pub fn from_toml_file(path: &Path) -> Result<Self, DbError> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| DbError::Config(format!("{}: {e}", path.display())))?;
        Ok(toml::from_str(&s)?)
    }

    /// Candidate config files, highest precedence first.
    #[must_use]
    pub fn config_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(p) = explicit {
            paths.push(p.to_path_buf());
        }
        if let Ok(p) = std::env::var("ROWBRIDGE_CONFIG") {
            paths.push(PathBuf::from(p));
        }
        if let Ok(cur) = std::env::current_dir() {
            paths.push(cur.join("rowbridge.toml"));
        }
        if let Some(dir) = dirs_next::config_dir() {
            paths.push(dir.join("rowbridge.toml"));
        }
        paths
    }

    /// Environment first, then each existing config file in precedence order.
    /// Unreadable or invalid files are skipped with a warning.
    #[must_use]
    pub fn load(explicit: Option<&Path>) -> Self {
        let mut cfg = Self::from_env_with(|k| std::env::var(k).ok());
        for p in Self::config_paths(explicit) {
            if !p.exists() {
                continue;
            }
            match Self::from_toml_file(&p) {
                Ok(file_cfg) => cfg.merge_missing(file_cfg),
                Err(e) => log::warn!("skipping config {}: {e}", p.display()),
            }
        }
        cfg
    }

    /// # Errors
    /// Supabase needs both a URL and an API key.
    pub fn validate(&self) -> Result<(), DbError> {
        if self.database_type() == DatabaseType::Supabase {
            if self.url.as_deref().is_none_or(str::is_empty) {
                return Err(DbError::Config("SUPABASE_URL is required".into()));
            }
            if self.api_key.as_deref().is_none_or(str::is_empty) {
                return Err(DbError::Config("Supabase API key (SUPABASE_ANON_KEY) is required".into()));
            }
        }
        Ok(())
    }

    /// `validate` when a database type was chosen explicitly. A config that never named
    /// a backend only drives local data files, which need no connection settings.
    ///
    /// # Errors
    /// Same as `validate`.
    pub fn validate_if_configured(&self) -> Result<(), DbError> {
        if self.database_type.is_some() { self.validate() } else { Ok(()) }
    }
}
