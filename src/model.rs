//! Table-level CRUD over a `RowStore`, shaped after document-database model APIs.

use crate::config::AdapterConfig;
use crate::errors::DbError;
use crate::query::{self, Filter, FindOptions, Predicate, is_null};
use crate::store::RowStore;
use crate::types::{Record, TableName};
use bson::Bson;
use std::future::Future;

pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub trait Model: Send + Sync {
    fn find(
        &self,
        filter: &Filter,
        opts: &FindOptions,
    ) -> impl Future<Output = Result<Vec<Record>, DbError>> + Send;

    fn find_one(&self, filter: &Filter) -> impl Future<Output = Result<Option<Record>, DbError>> + Send;

    fn find_by_id(&self, id: &str) -> impl Future<Output = Result<Option<Record>, DbError>> + Send;

    /// Insert `data`, filling in the id and timestamps when absent.
    fn create(&self, data: Record) -> impl Future<Output = Result<Record, DbError>> + Send;

    /// Merge `data` into the row with this id. `None` when no row matches.
    fn find_by_id_and_update(
        &self,
        id: &str,
        data: Record,
    ) -> impl Future<Output = Result<Option<Record>, DbError>> + Send;

    fn find_by_id_and_delete(&self, id: &str) -> impl Future<Output = Result<Option<Record>, DbError>> + Send;

    /// Update the first row matching `filter` (default sort) by its id.
    fn find_one_and_update(
        &self,
        filter: &Filter,
        data: Record,
    ) -> impl Future<Output = Result<Option<Record>, DbError>> + Send;

    /// Upsert: update by id when `record` carries one, create otherwise.
    fn save(&self, record: Record) -> impl Future<Output = Result<Record, DbError>> + Send;
}

/// A `Model` bound to one table of a row store.
#[derive(Debug, Clone)]
pub struct TableModel<S> {
    store: S,
    table: TableName,
    id_field: String,
}

impl<S: RowStore> TableModel<S> {
    pub fn new(store: S, table: impl Into<TableName>) -> Self {
        Self { store, table: table.into(), id_field: "id".to_string() }
    }

    #[must_use]
    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn by_id(&self, id: &str) -> Filter {
        Filter::from(vec![Predicate::Equals { field: self.id_field.clone(), value: Bson::String(id.to_string()) }])
    }

    async fn update_by_value(&self, id: &Bson, mut data: Record) -> Result<Option<Record>, DbError> {
        data.insert(UPDATED_AT, now_rfc3339());
        let updated = self.store.update_where(&self.table, &self.id_field, id, &data).await?;
        log::debug!("table={} update id={id} matched={}", self.table, updated.is_some());
        Ok(updated)
    }
}

impl<S: RowStore> Model for TableModel<S> {
    async fn find(&self, filter: &Filter, opts: &FindOptions) -> Result<Vec<Record>, DbError> {
        query::find(&self.store, &self.table, filter, opts).await
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Record>, DbError> {
        query::find_one(&self.store, &self.table, filter, &FindOptions::default()).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Record>, DbError> {
        self.find_one(&self.by_id(id)).await
    }

    async fn create(&self, mut data: Record) -> Result<Record, DbError> {
        if is_null(data.get(&self.id_field)) {
            data.insert(self.id_field.clone(), uuid::Uuid::new_v4().to_string());
        }
        let now = now_rfc3339();
        for key in [CREATED_AT, UPDATED_AT] {
            if is_null(data.get(key)) {
                data.insert(key, now.clone());
            }
        }
        self.store.insert(&self.table, data).await
    }

    async fn find_by_id_and_update(&self, id: &str, data: Record) -> Result<Option<Record>, DbError> {
        self.update_by_value(&Bson::String(id.to_string()), data).await
    }

    async fn find_by_id_and_delete(&self, id: &str) -> Result<Option<Record>, DbError> {
        self.store.delete_where(&self.table, &self.id_field, &Bson::String(id.to_string())).await
    }

    async fn find_one_and_update(&self, filter: &Filter, data: Record) -> Result<Option<Record>, DbError> {
        let Some(existing) = self.find_one(filter).await? else {
            return Ok(None);
        };
        let id = existing
            .get(&self.id_field)
            .filter(|v| !is_null(Some(v)))
            .cloned()
            .ok_or_else(|| DbError::MissingId(self.id_field.clone()))?;
        self.update_by_value(&id, data).await
    }

    async fn save(&self, record: Record) -> Result<Record, DbError> {
        let id = record.get(&self.id_field).filter(|v| !is_null(Some(v))).cloned();
        if let Some(id) = id {
            if let Some(updated) = self.update_by_value(&id, record.clone()).await? {
                return Ok(updated);
            }
        }
        self.create(record).await
    }
}

/// Maps model names to table names.
pub struct ModelFactory;

impl ModelFactory {
    #[must_use]
    pub fn table_name(model_name: &str) -> TableName {
        // Known tables (`users`, `events`, `bookings`) already use the lowercased name.
        model_name.to_lowercase()
    }

    /// A model for `model_name` using the configured id field.
    pub fn create_model<S: RowStore>(store: S, model_name: &str, cfg: &AdapterConfig) -> TableModel<S> {
        TableModel::new(store, Self::table_name(model_name)).with_id_field(cfg.id_field())
    }
}
