//! Storage traits and error types
//!
//! This module defines the trait interface for link store backends and
//! associated error types.

use crate::storage::LinkRecord;
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for link store backends
///
/// This trait defines all database operations needed by the crawl cycle and
/// the import/export paths. The store keeps one row per known link together
/// with a crawled flag; it never validates URL text and it tolerates
/// duplicate rows for the same URL.
pub trait LinkStore {
    /// Returns up to `limit` uncrawled records, oldest first
    ///
    /// Claiming does not change the records; they stay uncrawled until
    /// [`mark_crawled`](LinkStore::mark_crawled) commits the attempts.
    fn claim_uncrawled(&self, limit: usize) -> StoreResult<Vec<LinkRecord>>;

    /// Inserts every URL in the set as a new uncrawled record
    ///
    /// URLs already present in the store are inserted again; deduplication
    /// happens only within the set itself. The whole set commits atomically.
    fn insert_new(&mut self, urls: &HashSet<String>) -> StoreResult<()>;

    /// Marks the records with the given IDs as crawled
    ///
    /// Unknown IDs are ignored. The whole set commits atomically.
    fn mark_crawled(&mut self, ids: &HashSet<i64>) -> StoreResult<()>;

    /// Counts all records
    fn count(&self) -> StoreResult<u64>;

    /// Counts records not yet crawled
    fn count_uncrawled(&self) -> StoreResult<u64>;

    /// Returns a page of stored URLs ordered by ID, for bounded-memory scans
    fn load_url_page(&self, offset: u64, limit: u64) -> StoreResult<Vec<String>>;
}
