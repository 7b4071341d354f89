//! Storage module for the durable link store
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Claiming uncrawled batches and committing crawl results
//! - Bulk import of externally supplied URLs
//! - Paginated scans for bounded-memory exports

mod schema;
mod sqlite;
mod traits;

pub use schema::{initialize_schema, SCHEMA_SQL};
pub use sqlite::SqliteStore;
pub use traits::{LinkStore, StoreError, StoreResult};

use std::path::Path;

/// Opens (or creates) a link store database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully opened store
/// * `Err(StoreError)` - Failed to open or initialize the database
pub fn open_store(path: &Path) -> StoreResult<SqliteStore> {
    SqliteStore::open(path)
}

/// A stored link and its crawl status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    pub id: i64,
    pub url: String,
    pub crawled: bool,
}
