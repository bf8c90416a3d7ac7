//! Cache storage trait and SQLite implementation.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::traits::{CacheEntry, CacheTable};

/// Trait for cache storage backends.
///
/// Every operation touches a single table and at most a single key, so
/// implementations need no cross-key transactions.
pub trait CacheStorage: Send + Sync {
  /// Get the entry stored under `key`, if any.
  fn get(&self, table: CacheTable, key: &str) -> Result<Option<CacheEntry>>;

  /// Insert or replace the entry with the same key.
  fn upsert(&self, table: CacheTable, entry: &CacheEntry) -> Result<()>;

  /// Remove a single entry.
  fn delete(&self, table: CacheTable, key: &str) -> Result<()>;

  /// Remove every entry of a table.
  fn clear_all(&self, table: CacheTable) -> Result<()>;

  /// Number of entries currently stored in a table.
  fn count(&self, table: CacheTable) -> Result<usize>;
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn get(&self, _table: CacheTable, _key: &str) -> Result<Option<CacheEntry>> {
    Ok(None) // Always miss
  }

  fn upsert(&self, _table: CacheTable, _entry: &CacheEntry) -> Result<()> {
    Ok(()) // Discard
  }

  fn delete(&self, _table: CacheTable, _key: &str) -> Result<()> {
    Ok(())
  }

  fn clear_all(&self, _table: CacheTable) -> Result<()> {
    Ok(())
  }

  fn count(&self, _table: CacheTable) -> Result<usize> {
    Ok(0)
  }
}

/// SQLite-based cache storage implementation.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Create a new SQLite storage at the default location.
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;
    Self::open_at(&path)
  }

  /// Create a new SQLite storage at an explicit path.
  pub fn open_at(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::with_connection(conn)
  }

  /// Create a throwaway in-memory storage.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache database: {}", e))?;
    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;
    Ok(storage)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("marquee").join("cache.db"))
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
    self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))
  }

  /// Run database migrations for cache tables.
  fn run_migrations(&self) -> Result<()> {
    let conn = self.lock()?;

    let schema: String = CacheTable::ALL
      .iter()
      .map(|table| table_schema(table.table_name()))
      .collect();

    conn
      .execute_batch(&schema)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }
}

/// Schema shared by every cache table.
fn table_schema(name: &str) -> String {
  format!(
    "CREATE TABLE IF NOT EXISTS {name} (
        cache_key TEXT PRIMARY KEY,
        payload TEXT NOT NULL,
        cached_at INTEGER NOT NULL,
        current_page INTEGER NOT NULL DEFAULT 1,
        total_pages INTEGER NOT NULL DEFAULT 1
    );
    "
  )
}

impl CacheStorage for SqliteStorage {
  fn get(&self, table: CacheTable, key: &str) -> Result<Option<CacheEntry>> {
    let conn = self.lock()?;

    let sql = format!(
      "SELECT payload, cached_at, current_page, total_pages FROM {} WHERE cache_key = ?",
      table.table_name()
    );
    let mut stmt = conn
      .prepare(&sql)
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let row: Option<(String, i64, u32, u32)> = stmt
      .query_row(params![key], |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
      })
      .optional()
      .map_err(|e| eyre!("Failed to read cache entry {}: {}", key, e))?;

    match row {
      Some((payload, cached_at_ms, current_page, total_pages)) => {
        let cached_at = from_millis(cached_at_ms)?;
        Ok(Some(CacheEntry {
          key: key.to_string(),
          payload,
          cached_at,
          current_page,
          total_pages,
        }))
      }
      None => Ok(None),
    }
  }

  fn upsert(&self, table: CacheTable, entry: &CacheEntry) -> Result<()> {
    let conn = self.lock()?;

    let sql = format!(
      "INSERT OR REPLACE INTO {} (cache_key, payload, cached_at, current_page, total_pages)
       VALUES (?, ?, ?, ?, ?)",
      table.table_name()
    );
    conn
      .execute(
        &sql,
        params![
          entry.key,
          entry.payload,
          entry.cached_at.timestamp_millis(),
          entry.current_page,
          entry.total_pages
        ],
      )
      .map_err(|e| eyre!("Failed to store cache entry {}: {}", entry.key, e))?;

    Ok(())
  }

  fn delete(&self, table: CacheTable, key: &str) -> Result<()> {
    let conn = self.lock()?;

    let sql = format!("DELETE FROM {} WHERE cache_key = ?", table.table_name());
    conn
      .execute(&sql, params![key])
      .map_err(|e| eyre!("Failed to delete cache entry {}: {}", key, e))?;

    Ok(())
  }

  fn clear_all(&self, table: CacheTable) -> Result<()> {
    let conn = self.lock()?;

    let sql = format!("DELETE FROM {}", table.table_name());
    conn
      .execute(&sql, [])
      .map_err(|e| eyre!("Failed to clear {}: {}", table.table_name(), e))?;

    Ok(())
  }

  fn count(&self, table: CacheTable) -> Result<usize> {
    let conn = self.lock()?;

    let sql = format!("SELECT COUNT(*) FROM {}", table.table_name());
    let count: i64 = conn
      .query_row(&sql, [], |row| row.get(0))
      .map_err(|e| eyre!("Failed to count {}: {}", table.table_name(), e))?;

    Ok(count as usize)
  }
}

/// Convert a stored millisecond timestamp back into a UTC datetime.
fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
  DateTime::from_timestamp_millis(ms).ok_or_else(|| eyre!("Invalid cached_at timestamp {}", ms))
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn entry(key: &str, payload: &str, ms: i64) -> CacheEntry {
    CacheEntry::new(key, payload.to_string(), Utc.timestamp_millis_opt(ms).unwrap())
  }

  #[test]
  fn test_get_missing_is_none() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    assert_eq!(storage.get(CacheTable::Details, "detail_movie_1").unwrap(), None);
  }

  #[test]
  fn test_upsert_replaces_existing_entry() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    storage
      .upsert(CacheTable::TitleLists, &entry("trending", "[1]", 1_000))
      .unwrap();
    storage
      .upsert(CacheTable::TitleLists, &entry("trending", "[2]", 2_000))
      .unwrap();

    let stored = storage.get(CacheTable::TitleLists, "trending").unwrap().unwrap();
    assert_eq!(stored.payload, "[2]");
    assert_eq!(stored.cached_at.timestamp_millis(), 2_000);
    assert_eq!(storage.count(CacheTable::TitleLists).unwrap(), 1);
  }

  #[test]
  fn test_page_metadata_round_trips() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let paged = entry("upcoming_movies_1", "[]", 5).with_pages(1, 42);
    storage.upsert(CacheTable::TitleLists, &paged).unwrap();

    let stored = storage
      .get(CacheTable::TitleLists, "upcoming_movies_1")
      .unwrap()
      .unwrap();
    assert_eq!(stored, paged);
  }

  #[test]
  fn test_tables_are_isolated() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    storage
      .upsert(CacheTable::People, &entry("person_7", "{}", 1))
      .unwrap();
    storage
      .upsert(CacheTable::Credits, &entry("person_7", "[]", 1))
      .unwrap();

    storage.clear_all(CacheTable::People).unwrap();

    assert_eq!(storage.get(CacheTable::People, "person_7").unwrap(), None);
    assert!(storage.get(CacheTable::Credits, "person_7").unwrap().is_some());
  }

  #[test]
  fn test_delete_removes_only_that_key() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    storage
      .upsert(CacheTable::Reviews, &entry("reviews_movie_1", "[]", 1))
      .unwrap();
    storage
      .upsert(CacheTable::Reviews, &entry("reviews_movie_2", "[]", 1))
      .unwrap();

    storage.delete(CacheTable::Reviews, "reviews_movie_1").unwrap();
    // Deleting a missing key is not an error
    storage.delete(CacheTable::Reviews, "reviews_movie_404").unwrap();

    assert_eq!(storage.get(CacheTable::Reviews, "reviews_movie_1").unwrap(), None);
    assert_eq!(storage.count(CacheTable::Reviews).unwrap(), 1);
  }

  #[test]
  fn test_entries_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("cache.db");

    {
      let storage = SqliteStorage::open_at(&path).unwrap();
      storage
        .upsert(CacheTable::Details, &entry("detail_tv_9", "{\"id\":9}", 77))
        .unwrap();
    }

    let reopened = SqliteStorage::open_at(&path).unwrap();
    let stored = reopened.get(CacheTable::Details, "detail_tv_9").unwrap().unwrap();
    assert_eq!(stored.payload, "{\"id\":9}");
    assert_eq!(stored.cached_at.timestamp_millis(), 77);
  }

  #[test]
  fn test_noop_storage_always_misses() {
    let storage = NoopStorage;
    storage
      .upsert(CacheTable::TitleLists, &entry("trending", "[]", 1))
      .unwrap();
    assert_eq!(storage.get(CacheTable::TitleLists, "trending").unwrap(), None);
    assert_eq!(storage.count(CacheTable::TitleLists).unwrap(), 0);
  }
}
