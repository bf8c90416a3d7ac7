//! Cache layer that orchestrates caching logic with network fetching.

use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use super::codec::JsonCodec;
use super::policy::is_expired;
use super::storage::CacheStorage;
use super::traits::{CacheEntry, CacheResult, CacheTable, Clock, Page, QueryKey, SystemClock};

/// Stale-while-revalidate executor.
///
/// 1. Read the cached payload and its timestamp
/// 2. Fresh payload: decode and return without touching the network
/// 3. Otherwise fetch from the network once
///    - success: write it to the cache (even if empty) and return it
///    - failure: serve the cached payload of any age, or propagate the error
///
/// Cache read, decode and write failures never fail the call; they are logged
/// and the cache is treated as empty. Only a remote error with nothing cached
/// reaches the caller.
pub async fn cached_or<T, E, Fut>(
  read_payload: impl FnOnce() -> Result<Option<String>>,
  read_cached_at: impl FnOnce() -> Result<Option<DateTime<Utc>>>,
  is_fresh: impl FnOnce(DateTime<Utc>) -> bool,
  deserialize: impl Fn(&str) -> Result<T>,
  fetch_remote: impl FnOnce() -> Fut,
  write_cache: impl FnOnce(&T) -> Result<()>,
) -> std::result::Result<CacheResult<T>, E>
where
  Fut: Future<Output = std::result::Result<T, E>>,
  E: Display,
{
  let payload = read_payload().unwrap_or_else(|e| {
    warn!(error = %e, "Cache read failed, treating as miss");
    None
  });
  let cached_at = read_cached_at().unwrap_or_else(|e| {
    warn!(error = %e, "Cache timestamp read failed, treating as miss");
    None
  });

  if let (Some(json), Some(at)) = (payload.as_deref(), cached_at) {
    if is_fresh(at) {
      match deserialize(json) {
        Ok(data) => return Ok(CacheResult::from_cache(data, Some(at))),
        Err(e) => warn!(error = %e, "Ignoring unreadable cache entry"),
      }
    }
  }

  match fetch_remote().await {
    Ok(data) => {
      if let Err(e) = write_cache(&data) {
        warn!(error = %e, "Failed to write cache entry");
      }
      Ok(CacheResult::from_network(data))
    }
    Err(err) => {
      let Some(json) = payload else {
        return Err(err);
      };
      match deserialize(&json) {
        Ok(data) => {
          warn!(error = %err, "Network fetch failed, serving stale cache");
          Ok(CacheResult::offline(data, cached_at))
        }
        Err(e) => {
          warn!(error = %e, "Stale cache entry unreadable");
          Err(err)
        }
      }
    }
  }
}

/// Cache layer that manages caching logic and network fetching.
///
/// This layer sits between the application and the network client, binding
/// [`cached_or`] to a storage backend, a clock and the shared codec.
#[derive(Clone)]
pub struct CacheLayer {
  storage: Arc<dyn CacheStorage>,
  clock: Arc<dyn Clock>,
  codec: JsonCodec,
}

impl CacheLayer {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: Arc<dyn CacheStorage>) -> Self {
    Self {
      storage,
      clock: Arc::new(SystemClock),
      codec: JsonCodec,
    }
  }

  /// Replace the wall clock used for stamping and aging entries.
  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub fn now(&self) -> DateTime<Utc> {
    self.clock.now()
  }

  /// Fetch a value with the stale-while-revalidate strategy.
  pub async fn fetch<K, T, F, Fut>(&self, key: &K, fetcher: F) -> Result<CacheResult<T>>
  where
    K: QueryKey,
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    self
      .run(
        key,
        fetcher,
        |payload, _, _| self.codec.decode(payload),
        |value| Ok((self.codec.encode(value)?, 1, 1)),
      )
      .await
  }

  /// Fetch a page of results. The items are stored as the payload and the
  /// page numbers as entry metadata.
  pub async fn fetch_paged<K, T, F, Fut>(&self, key: &K, fetcher: F) -> Result<CacheResult<Page<T>>>
  where
    K: QueryKey,
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
  {
    self
      .run(
        key,
        fetcher,
        |payload, current_page, total_pages| {
          let items: Vec<T> = self.codec.decode(payload)?;
          Ok(Page::new(items, current_page, total_pages))
        },
        |page: &Page<T>| {
          let payload = self.codec.encode(&page.items)?;
          Ok((payload, page.current_page, page.total_pages))
        },
      )
      .await
  }

  async fn run<K, T, F, Fut, D, En>(
    &self,
    key: &K,
    fetcher: F,
    decode: D,
    encode: En,
  ) -> Result<CacheResult<T>>
  where
    K: QueryKey,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
    D: Fn(&str, u32, u32) -> Result<T>,
    En: FnOnce(&T) -> Result<(String, u32, u32)>,
  {
    let cache_key = key.cache_key();
    let table = key.table();
    let ttl = key.category().ttl();

    // One storage read feeds both the payload and the timestamp reader
    let (payload, cached_at, pages) = match self.storage.get(table, &cache_key) {
      Ok(Some(entry)) => (
        Ok(Some(entry.payload)),
        Ok(Some(entry.cached_at)),
        (entry.current_page, entry.total_pages),
      ),
      Ok(None) => (Ok(None), Ok(None), (1, 1)),
      Err(e) => (Err(e), Ok(None), (1, 1)),
    };

    let result = cached_or(
      || payload,
      || cached_at,
      |at| !is_expired(at, ttl, self.clock.now()),
      |json| decode(json, pages.0, pages.1),
      fetcher,
      |value| {
        let (payload, current_page, total_pages) = encode(value)?;
        let entry = CacheEntry::new(cache_key.as_str(), payload, self.clock.now())
          .with_pages(current_page, total_pages);
        self.storage.upsert(table, &entry)
      },
    )
    .await?;

    debug!(
      key = %cache_key,
      source = ?result.source,
      cached_at = ?result.cached_at,
      "{}",
      key.description()
    );

    Ok(result)
  }

  /// Drop the cached entry for a single key.
  pub fn invalidate<K: QueryKey>(&self, key: &K) -> Result<()> {
    self.storage.delete(key.table(), &key.cache_key())
  }

  /// Drop every entry of a table.
  pub fn clear(&self, table: CacheTable) -> Result<()> {
    self.storage.clear_all(table)
  }

  /// Entry count per table.
  pub fn stats(&self) -> Result<Vec<(CacheTable, usize)>> {
    let mut stats = Vec::with_capacity(CacheTable::ALL.len());
    for table in CacheTable::ALL {
      stats.push((table, self.storage.count(table)?));
    }
    Ok(stats)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::policy::Category;
  use crate::cache::storage::SqliteStorage;
  use crate::cache::traits::{CacheSource, ManualClock};
  use chrono::{Duration, TimeZone};
  use color_eyre::eyre::eyre;
  use std::cell::Cell;
  use std::sync::atomic::{AtomicUsize, Ordering};

  fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
  }

  fn decode_list(json: &str) -> Result<Vec<String>> {
    JsonCodec.decode(json)
  }

  // ==========================================================================
  // Executor
  // ==========================================================================

  #[tokio::test]
  async fn test_fresh_hit_skips_network() {
    let fetched = Cell::new(0);
    let written = Cell::new(0);

    let result = cached_or(
      || Ok(Some(r#"["a","b"]"#.to_string())),
      || Ok(Some(t0())),
      |_| true,
      decode_list,
      || {
        fetched.set(fetched.get() + 1);
        async { Ok::<_, String>(vec!["x".to_string()]) }
      },
      |_| {
        written.set(written.get() + 1);
        Ok(())
      },
    )
    .await
    .unwrap();

    assert_eq!(result.data, vec!["a", "b"]);
    assert_eq!(result.source, CacheSource::CacheFresh);
    assert_eq!(result.cached_at, Some(t0()));
    assert_eq!(fetched.get(), 0);
    assert_eq!(written.get(), 0);
  }

  #[tokio::test]
  async fn test_stale_entry_fetches_once_and_writes() {
    let fetched = Cell::new(0);
    let written = Cell::new(Vec::new());

    let result = cached_or(
      || Ok(Some(r#"["old"]"#.to_string())),
      || Ok(Some(t0())),
      |_| false,
      decode_list,
      || {
        fetched.set(fetched.get() + 1);
        async { Ok::<_, String>(vec!["new".to_string()]) }
      },
      |value: &Vec<String>| {
        written.set(value.clone());
        Ok(())
      },
    )
    .await
    .unwrap();

    assert_eq!(result.data, vec!["new"]);
    assert_eq!(result.source, CacheSource::Network);
    assert_eq!(fetched.get(), 1);
    assert_eq!(written.take(), vec!["new"]);
  }

  #[tokio::test]
  async fn test_missing_timestamp_is_not_a_fresh_hit() {
    let fetched = Cell::new(0);

    let result = cached_or(
      || Ok(Some(r#"["old"]"#.to_string())),
      || Ok(None),
      |_| true,
      decode_list,
      || {
        fetched.set(fetched.get() + 1);
        async { Ok::<_, String>(vec!["new".to_string()]) }
      },
      |_| Ok(()),
    )
    .await
    .unwrap();

    assert_eq!(result.data, vec!["new"]);
    assert_eq!(fetched.get(), 1);
  }

  #[tokio::test]
  async fn test_fetch_failure_serves_stale() {
    let result = cached_or(
      || Ok(Some(r#"["old"]"#.to_string())),
      || Ok(Some(t0() - Duration::days(365))),
      |_| false,
      decode_list,
      || async { Err::<Vec<String>, _>("offline".to_string()) },
      |_| panic!("must not write after a failed fetch"),
    )
    .await
    .unwrap();

    assert_eq!(result.data, vec!["old"]);
    assert_eq!(result.source, CacheSource::Offline);
  }

  #[tokio::test]
  async fn test_fetch_failure_without_cache_propagates() {
    let result = cached_or(
      || Ok(None),
      || Ok(None),
      |_| true,
      decode_list,
      || async { Err::<Vec<String>, _>("offline".to_string()) },
      |_| Ok(()),
    )
    .await;

    assert_eq!(result.unwrap_err(), "offline");
  }

  #[tokio::test]
  async fn test_corrupt_fresh_entry_falls_through_to_network() {
    let result = cached_or(
      || Ok(Some("{garbage".to_string())),
      || Ok(Some(t0())),
      |_| true,
      decode_list,
      || async { Ok::<_, String>(vec!["new".to_string()]) },
      |_| Ok(()),
    )
    .await
    .unwrap();

    assert_eq!(result.data, vec!["new"]);
    assert_eq!(result.source, CacheSource::Network);
  }

  #[tokio::test]
  async fn test_corrupt_stale_entry_propagates_fetch_error() {
    let result = cached_or(
      || Ok(Some("{garbage".to_string())),
      || Ok(Some(t0())),
      |_| false,
      decode_list,
      || async { Err::<Vec<String>, _>("offline".to_string()) },
      |_| Ok(()),
    )
    .await;

    assert_eq!(result.unwrap_err(), "offline");
  }

  #[tokio::test]
  async fn test_read_failure_fails_open() {
    let result = cached_or(
      || Err(eyre!("disk on fire")),
      || Err(eyre!("disk on fire")),
      |_| true,
      decode_list,
      || async { Ok::<_, String>(vec!["new".to_string()]) },
      |_| Ok(()),
    )
    .await
    .unwrap();

    assert_eq!(result.data, vec!["new"]);
  }

  #[tokio::test]
  async fn test_write_failure_still_returns_value() {
    let result = cached_or(
      || Ok(None),
      || Ok(None),
      |_| true,
      decode_list,
      || async { Ok::<_, String>(vec!["new".to_string()]) },
      |_| Err(eyre!("read-only filesystem")),
    )
    .await
    .unwrap();

    assert_eq!(result.data, vec!["new"]);
    assert_eq!(result.source, CacheSource::Network);
  }

  // ==========================================================================
  // CacheLayer bound to storage
  // ==========================================================================

  struct TestKey(&'static str);

  impl QueryKey for TestKey {
    fn cache_key(&self) -> String {
      self.0.to_string()
    }

    fn table(&self) -> CacheTable {
      CacheTable::TitleLists
    }

    fn category(&self) -> Category {
      Category::Trending
    }

    fn description(&self) -> String {
      format!("test {}", self.0)
    }
  }

  fn layer() -> (CacheLayer, Arc<SqliteStorage>, Arc<ManualClock>) {
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let clock = Arc::new(ManualClock::new(t0()));
    let layer = CacheLayer::new(storage.clone()).with_clock(clock.clone());
    (layer, storage, clock)
  }

  #[tokio::test]
  async fn test_layer_expires_after_ttl() {
    let (layer, _storage, clock) = layer();
    let calls = AtomicUsize::new(0);
    let calls = &calls;
    let key = TestKey("trending");

    let fetch = move || async move {
      let n = calls.fetch_add(1, Ordering::SeqCst);
      Ok(vec![n])
    };

    assert_eq!(layer.fetch(&key, fetch).await.unwrap().data, vec![0]);

    clock.advance(Duration::minutes(60));
    let hit = layer.fetch(&key, fetch).await.unwrap();
    assert_eq!(hit.data, vec![0]);
    assert_eq!(hit.source, CacheSource::CacheFresh);

    clock.advance(Duration::minutes(1));
    assert_eq!(layer.fetch(&key, fetch).await.unwrap().data, vec![1]);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_layer_empty_result_overwrites() {
    let (layer, storage, clock) = layer();
    let key = TestKey("trending");

    layer
      .fetch(&key, || async { Ok(vec![1, 2, 3]) })
      .await
      .unwrap();
    clock.advance(Duration::hours(2));
    let result = layer
      .fetch(&key, || async { Ok(Vec::<i32>::new()) })
      .await
      .unwrap();
    assert!(result.data.is_empty());

    let stored = storage.get(CacheTable::TitleLists, "trending").unwrap().unwrap();
    assert_eq!(stored.payload, "[]");
    assert_eq!(stored.cached_at, clock.now());
  }

  #[tokio::test]
  async fn test_layer_paged_keeps_page_metadata() {
    let (layer, storage, clock) = layer();
    let key = TestKey("upcoming_movies_1");

    layer
      .fetch_paged(&key, || async { Ok(Page::new(vec!["a".to_string()], 1, 17)) })
      .await
      .unwrap();

    let stored = storage
      .get(CacheTable::TitleLists, "upcoming_movies_1")
      .unwrap()
      .unwrap();
    assert_eq!(stored.total_pages, 17);

    clock.advance(Duration::minutes(5));
    let cached = layer
      .fetch_paged::<_, String, _, _>(&key, || async { Err(eyre!("should not be called")) })
      .await
      .unwrap();
    assert_eq!(cached.data, Page::new(vec!["a".to_string()], 1, 17));
    assert_eq!(cached.source, CacheSource::CacheFresh);
  }

  #[tokio::test]
  async fn test_layer_invalidate_and_stats() {
    let (layer, _storage, _clock) = layer();
    let key = TestKey("trending");

    layer.fetch(&key, || async { Ok(1) }).await.unwrap();
    let lists = layer
      .stats()
      .unwrap()
      .into_iter()
      .find(|(table, _)| *table == CacheTable::TitleLists)
      .unwrap();
    assert_eq!(lists.1, 1);

    layer.invalidate(&key).unwrap();
    let result = layer.fetch(&key, || async { Err::<i32, _>(eyre!("offline")) }).await;
    assert!(result.is_err());
  }
}
