//! The row store boundary.
//!
//! Everything the query engine needs from the backing database goes through
//! `RowStore`. The full-table read used by the fallback path is its own named
//! operation (`fetch_all`) so its cost stays visible at call sites.

mod memory;

pub use memory::{MemoryStore, like_match};

use crate::errors::DbError;
use crate::query::NativeQuery;
use crate::types::Record;
use bson::Bson;
use std::future::Future;
use std::sync::Arc;

pub trait RowStore: Send + Sync {
    /// Constraint-qualified select with server-side ordering and limit.
    fn select(
        &self,
        table: &str,
        query: &NativeQuery,
    ) -> impl Future<Output = Result<Vec<Record>, DbError>> + Send;

    /// Every row of `table`, unfiltered and unordered. Cost is linear in table size.
    fn fetch_all(&self, table: &str) -> impl Future<Output = Result<Vec<Record>, DbError>> + Send;

    /// Insert one row and return it as stored.
    fn insert(&self, table: &str, record: Record) -> impl Future<Output = Result<Record, DbError>> + Send;

    /// Merge `patch` into the first row whose `field` equals `value`; returns the updated row.
    fn update_where(
        &self,
        table: &str,
        field: &str,
        value: &Bson,
        patch: &Record,
    ) -> impl Future<Output = Result<Option<Record>, DbError>> + Send;

    /// Remove the first row whose `field` equals `value`; returns the removed row.
    fn delete_where(
        &self,
        table: &str,
        field: &str,
        value: &Bson,
    ) -> impl Future<Output = Result<Option<Record>, DbError>> + Send;
}

impl<S: RowStore> RowStore for Arc<S> {
    fn select(
        &self,
        table: &str,
        query: &NativeQuery,
    ) -> impl Future<Output = Result<Vec<Record>, DbError>> + Send {
        (**self).select(table, query)
    }

    fn fetch_all(&self, table: &str) -> impl Future<Output = Result<Vec<Record>, DbError>> + Send {
        (**self).fetch_all(table)
    }

    fn insert(&self, table: &str, record: Record) -> impl Future<Output = Result<Record, DbError>> + Send {
        (**self).insert(table, record)
    }

    fn update_where(
        &self,
        table: &str,
        field: &str,
        value: &Bson,
        patch: &Record,
    ) -> impl Future<Output = Result<Option<Record>, DbError>> + Send {
        (**self).update_where(table, field, value, patch)
    }

    fn delete_where(
        &self,
        table: &str,
        field: &str,
        value: &Bson,
    ) -> impl Future<Output = Result<Option<Record>, DbError>> + Send {
        (**self).delete_where(table, field, value)
    }
}
