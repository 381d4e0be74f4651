//! MongoDB-shaped query filters over a relational row store.
//!
//! `query::find` translates a filter into native row-store constraints when it can,
//! and otherwise fetches the table and evaluates the filter in memory. Both paths
//! return the same rows in the same order.

pub mod cli;
pub mod config;
pub mod errors;
pub mod model;
pub mod normalize;
pub mod query;
pub mod store;
pub mod types;
pub mod utils;

pub use utils::logger;

pub use errors::DbError;
pub use model::{Model, ModelFactory, TableModel};
pub use query::{Filter, FindOptions, Predicate, SortSpec, find};
pub use store::{MemoryStore, RowStore};

/// Configure logging from `ROWBRIDGE_*` environment variables.
///
/// # Errors
/// Returns an error if logging was already initialized or an appender cannot be built.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    logger::configure_from_env()
}
