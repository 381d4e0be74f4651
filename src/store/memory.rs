use crate::errors::DbError;
use crate::query::{Constraint, NativeQuery, field_equals, field_in, field_not_equals, shape};
use crate::types::{Record, TableName};
use bson::Bson;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use super::RowStore;

/// In-process row store. Applies native constraints, ordering and limit the way a
/// PostgREST backend would, and can be switched offline to simulate outages.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<TableName, Vec<Record>>>,
    offline: AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table. Existing tables are left untouched.
    pub fn create_table(&self, name: &str) {
        self.tables.write().entry(name.to_string()).or_default();
    }

    /// Append rows, creating the table if needed.
    pub fn insert_many(&self, name: &str, rows: impl IntoIterator<Item = Record>) {
        self.tables.write().entry(name.to_string()).or_default().extend(rows);
    }

    #[must_use]
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn row_count(&self, name: &str) -> Option<usize> {
        self.tables.read().get(name).map(Vec::len)
    }

    /// While offline every operation fails with `BackendUnavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Load tables from a JSON object of the form `{ "events": [ {...}, ... ] }`.
    ///
    /// # Errors
    /// Returns an error if the JSON is not an object of arrays of objects.
    pub fn from_json_str(json: &str) -> Result<Self, DbError> {
        let val: serde_json::Value = serde_json::from_str(json)?;
        let obj = val
            .as_object()
            .ok_or_else(|| DbError::Io("data file must hold a JSON object of tables".into()))?;
        let store = Self::new();
        for (table, rows) in obj {
            let rows = rows
                .as_array()
                .ok_or_else(|| DbError::Io(format!("table `{table}` must be a JSON array")))?;
            let mut records = Vec::with_capacity(rows.len());
            for row in rows {
                records.push(crate::utils::json::json_value_to_document(row)?);
            }
            store.insert_many(table, records);
        }
        log::info!("loaded {} table(s) into memory store", obj.len());
        Ok(store)
    }

    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self, DbError> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| DbError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&s)
    }

    fn check_online(&self) -> Result<(), DbError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(DbError::BackendUnavailable("row store is offline".into()));
        }
        Ok(())
    }

    fn with_table<T>(&self, table: &str, f: impl FnOnce(&Vec<Record>) -> T) -> Result<T, DbError> {
        self.check_online()?;
        let tables = self.tables.read();
        let rows = tables.get(table).ok_or_else(|| DbError::NoSuchTable(table.to_string()))?;
        Ok(f(rows))
    }

    fn with_table_mut<T>(
        &self,
        table: &str,
        f: impl FnOnce(&mut Vec<Record>) -> T,
    ) -> Result<T, DbError> {
        self.check_online()?;
        let mut tables = self.tables.write();
        let rows = tables.get_mut(table).ok_or_else(|| DbError::NoSuchTable(table.to_string()))?;
        Ok(f(rows))
    }
}

fn satisfies(row: &Record, c: &Constraint) -> bool {
    match c {
        Constraint::Eq { field, value } => field_equals(row.get(field), value),
        Constraint::Neq { field, value } => field_not_equals(row.get(field), value),
        Constraint::In { field, values } => field_in(row.get(field), values),
        Constraint::IsNull { field } => crate::query::is_null(row.get(field)),
        Constraint::NotNull { field } => !crate::query::is_null(row.get(field)),
        Constraint::ILike { field, pattern } => {
            matches!(row.get(field), Some(Bson::String(s)) if like_match(s, pattern, true))
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum LikeToken {
    Any,
    One,
    Lit(char),
}

fn tokenize_like(pattern: &str, fold: bool) -> Vec<LikeToken> {
    let mut out = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        out.push(match ch {
            '%' => LikeToken::Any,
            '_' => LikeToken::One,
            '\\' => match chars.next() {
                Some(esc) => LikeToken::Lit(fold_char(esc, fold)),
                None => LikeToken::Lit('\\'),
            },
            other => LikeToken::Lit(fold_char(other, fold)),
        });
    }
    out
}

fn fold_char(c: char, fold: bool) -> char {
    if fold { c.to_lowercase().next().unwrap_or(c) } else { c }
}

/// SQL LIKE matching: `%` any run, `_` one character, `\` escapes.
#[must_use]
pub fn like_match(text: &str, pattern: &str, case_insensitive: bool) -> bool {
    let toks = tokenize_like(pattern, case_insensitive);
    let text: Vec<char> = text.chars().map(|c| fold_char(c, case_insensitive)).collect();
    let (mut t, mut p) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;
    while t < text.len() {
        match toks.get(p) {
            Some(LikeToken::Any) => {
                star = Some((p, t));
                p += 1;
            }
            Some(LikeToken::One) => {
                t += 1;
                p += 1;
            }
            Some(LikeToken::Lit(c)) if *c == text[t] => {
                t += 1;
                p += 1;
            }
            _ => match star {
                Some((sp, st)) => {
                    p = sp + 1;
                    t = st + 1;
                    star = Some((sp, st + 1));
                }
                None => return false,
            },
        }
    }
    toks[p..].iter().all(|tok| matches!(tok, LikeToken::Any))
}

impl RowStore for MemoryStore {
    async fn select(&self, table: &str, query: &NativeQuery) -> Result<Vec<Record>, DbError> {
        let rows = self.with_table(table, |rows| {
            rows.iter()
                .filter(|r| query.constraints.iter().all(|c| satisfies(r, c)))
                .cloned()
                .collect::<Vec<_>>()
        })?;
        Ok(shape(rows, &query.order, query.limit))
    }

    async fn fetch_all(&self, table: &str) -> Result<Vec<Record>, DbError> {
        self.with_table(table, |rows| rows.clone())
    }

    async fn insert(&self, table: &str, record: Record) -> Result<Record, DbError> {
        self.with_table_mut(table, |rows| {
            rows.push(record.clone());
            record
        })
    }

    async fn update_where(
        &self,
        table: &str,
        field: &str,
        value: &Bson,
        patch: &Record,
    ) -> Result<Option<Record>, DbError> {
        self.with_table_mut(table, |rows| {
            let row = rows.iter_mut().find(|r| field_equals(r.get(field), value))?;
            for (k, v) in patch {
                row.insert(k.clone(), v.clone());
            }
            Some(row.clone())
        })
    }

    async fn delete_where(
        &self,
        table: &str,
        field: &str,
        value: &Bson,
    ) -> Result<Option<Record>, DbError> {
        self.with_table_mut(table, |rows| {
            let idx = rows.iter().position(|r| field_equals(r.get(field), value))?;
            Some(rows.remove(idx))
        })
    }
}
