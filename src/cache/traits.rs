//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::policy::Category;

/// Logical table a cache entry lives in.
///
/// Every table has the same shape; splitting them keeps unrelated content
/// (lists, detail records, people...) independently clearable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheTable {
  TitleLists,
  Details,
  Credits,
  People,
  Reviews,
}

impl CacheTable {
  pub const ALL: [CacheTable; 5] = [
    CacheTable::TitleLists,
    CacheTable::Details,
    CacheTable::Credits,
    CacheTable::People,
    CacheTable::Reviews,
  ];

  /// SQL table name backing this cache table.
  pub fn table_name(self) -> &'static str {
    match self {
      Self::TitleLists => "title_list_cache",
      Self::Details => "title_detail_cache",
      Self::Credits => "credits_cache",
      Self::People => "person_cache",
      Self::Reviews => "reviews_cache",
    }
  }

  /// Short name used on the command line and in logs.
  pub fn name(self) -> &'static str {
    match self {
      Self::TitleLists => "lists",
      Self::Details => "details",
      Self::Credits => "credits",
      Self::People => "people",
      Self::Reviews => "reviews",
    }
  }
}

/// One cached response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
  pub key: String,
  /// Serialized domain value
  pub payload: String,
  /// When the entry was written
  pub cached_at: DateTime<Utc>,
  /// Page metadata, only meaningful for paginated lists
  pub current_page: u32,
  pub total_pages: u32,
}

impl CacheEntry {
  pub fn new(key: impl Into<String>, payload: String, cached_at: DateTime<Utc>) -> Self {
    Self {
      key: key.into(),
      payload,
      cached_at,
      current_page: 1,
      total_pages: 1,
    }
  }

  pub fn with_pages(mut self, current_page: u32, total_pages: u32) -> Self {
    self.current_page = current_page;
    self.total_pages = total_pages;
    self
  }
}

/// A page of results from a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
  pub items: Vec<T>,
  pub current_page: u32,
  pub total_pages: u32,
}

impl<T> Page<T> {
  pub fn new(items: Vec<T>, current_page: u32, total_pages: u32) -> Self {
    Self {
      items,
      current_page,
      total_pages,
    }
  }
}

/// Identifies a unique cacheable result.
///
/// Implementors decide the key string, the table it is stored in and the
/// freshness category that governs its TTL.
pub trait QueryKey {
  /// Stable key, unique within `table()`.
  fn cache_key(&self) -> String;

  fn table(&self) -> CacheTable;

  fn category(&self) -> Category;

  /// Human readable description for logging.
  fn description(&self) -> String;
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  /// Create a new cache result from a cache entry still within its TTL.
  pub fn from_cache(data: T, cached_at: Option<DateTime<Utc>>) -> Self {
    Self {
      data,
      source: CacheSource::CacheFresh,
      cached_at,
    }
  }

  /// Create a new cache result for offline mode.
  pub fn offline(data: T, cached_at: Option<DateTime<Utc>>) -> Self {
    Self {
      data,
      source: CacheSource::Offline,
      cached_at,
    }
  }
}

/// Indicates where cached data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Data from cache, still considered fresh
  CacheFresh,
  /// Network fetch failed, serving cached data of any age
  Offline,
}

/// Wall-clock source for stamping and aging cache entries.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// Clock that only moves when told to.
#[cfg(test)]
#[derive(Debug)]
pub struct ManualClock(std::sync::Mutex<DateTime<Utc>>);

#[cfg(test)]
impl ManualClock {
  pub fn new(start: DateTime<Utc>) -> Self {
    Self(std::sync::Mutex::new(start))
  }

  pub fn advance(&self, by: chrono::Duration) {
    let mut now = self.0.lock().unwrap();
    *now += by;
  }
}

#[cfg(test)]
impl Clock for ManualClock {
  fn now(&self) -> DateTime<Utc> {
    *self.0.lock().unwrap()
  }
}
