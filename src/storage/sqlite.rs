//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the LinkStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{LinkStore, StoreResult};
use crate::storage::LinkRecord;
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::path::Path;

/// SQLite link store backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) a link store at the given path
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StoreError)` - Failed to open database
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance and for tolerating a
        // second connection (stats and export run against a live database)
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        // Initialize schema
        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl LinkStore for SqliteStore {
    fn claim_uncrawled(&self, limit: usize) -> StoreResult<Vec<LinkRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, link, crawled FROM links WHERE crawled = 0 ORDER BY id LIMIT ?1",
        )?;

        let records = stmt
            .query_map(params![limit as i64], |row| {
                Ok(LinkRecord {
                    id: row.get(0)?,
                    url: row.get(1)?,
                    crawled: row.get::<_, i64>(2)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn insert_new(&mut self, urls: &HashSet<String>) -> StoreResult<()> {
        if urls.is_empty() {
            return Ok(());
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare("INSERT INTO links (link, crawled) VALUES (?1, 0)")?;
            for url in urls {
                stmt.execute(params![url])?;
            }
        }
        tx.commit()?;

        Ok(())
    }

    fn mark_crawled(&mut self, ids: &HashSet<i64>) -> StoreResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare("UPDATE links SET crawled = 1 WHERE id = ?1")?;
            for id in ids {
                stmt.execute(params![id])?;
            }
        }
        tx.commit()?;

        Ok(())
    }

    fn count(&self) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM links", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_uncrawled(&self) -> StoreResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM links WHERE crawled = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn load_url_page(&self, offset: u64, limit: u64) -> StoreResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT link FROM links ORDER BY id LIMIT ?1 OFFSET ?2")?;

        let urls = stmt
            .query_map(params![limit as i64, offset as i64], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(urls)
    }
}
