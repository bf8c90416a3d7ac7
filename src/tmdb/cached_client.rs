//! Cached catalog client that wraps a remote catalog with transparent caching.

use chrono::NaiveDate;
use color_eyre::{eyre::eyre, Result};
use futures::future::join_all;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::{CacheLayer, CacheStorage, CacheTable, NoopStorage, Page, SqliteStorage};
use crate::config::Config;

use super::cache::CatalogKey;
use super::client::{Catalog, TmdbClient};
use super::picks::default_picks;
use super::types::{
  CastMember, CrewMember, CuratedItem, Listing, MediaType, Person, ReleaseWindow, Review,
  ScheduleDay, SearchResult, Title, TitleDetail,
};

/// Catalog client with transparent caching support.
///
/// This wraps a [`Catalog`] and provides the same reads, but serves
/// fresh entries from the cache and falls back to stale ones when the
/// network is unavailable. Search is always live.
#[derive(Clone)]
pub struct CachedCatalog<C> {
  inner: C,
  cache: CacheLayer,
  picks: Vec<CuratedItem>,
}

impl CachedCatalog<TmdbClient> {
  /// Create a cached TMDB client from configuration.
  pub fn from_config(config: &Config) -> Result<Self> {
    let inner = TmdbClient::new(config)?;

    let storage: Arc<dyn CacheStorage> = if config.cache.enabled {
      let storage = match &config.cache.path {
        Some(path) => SqliteStorage::open_at(path)?,
        None => SqliteStorage::open()?,
      };
      Arc::new(storage)
    } else {
      debug!("Cache disabled, every read goes to the network");
      Arc::new(NoopStorage)
    };

    let mut client = Self::new(inner, CacheLayer::new(storage));
    if let Some(picks) = &config.editors_picks {
      client = client.with_picks(picks.clone());
    }
    Ok(client)
  }
}

impl<C: Catalog> CachedCatalog<C> {
  pub fn new(inner: C, cache: CacheLayer) -> Self {
    Self {
      inner,
      cache,
      picks: default_picks(),
    }
  }

  /// Replace the curated editor's picks.
  pub fn with_picks(mut self, picks: Vec<CuratedItem>) -> Self {
    self.picks = picks;
    self
  }

  pub async fn trending(&self) -> Result<Vec<Title>> {
    let result = self
      .cache
      .fetch(&CatalogKey::Trending, || self.inner.trending())
      .await?;

    Ok(result.data)
  }

  /// Get the curated titles with caching.
  pub async fn editors_picks(&self) -> Result<Vec<Title>> {
    let result = self
      .cache
      .fetch(&CatalogKey::EditorsPicks, || self.fetch_picks())
      .await?;

    Ok(result.data)
  }

  /// Each title is fetched concurrently and failures are skipped. The list
  /// only fails when no title could be fetched at all, which lets the cache
  /// serve the previous list instead.
  async fn fetch_picks(&self) -> Result<Vec<Title>> {
    let fetches = self.picks.iter().map(|item| async move {
      (item, self.inner.title(item.media_type, item.id).await)
    });

    let mut titles = Vec::with_capacity(self.picks.len());
    for (item, result) in join_all(fetches).await {
      match result {
        Ok(title) => titles.push(title),
        Err(e) => warn!(
          id = item.id,
          media = item.media_type.as_str(),
          error = %e,
          "Skipping editor's pick"
        ),
      }
    }

    if titles.is_empty() && !self.picks.is_empty() {
      return Err(eyre!("Failed to fetch any of {} editor's picks", self.picks.len()));
    }
    Ok(titles)
  }

  /// Titles released within the last 30 days.
  pub async fn previous(&self, media: MediaType, page: u32) -> Result<Page<Title>> {
    self.window(ReleaseWindow::Previous, media, page).await
  }

  /// Titles releasing within the next 7 days.
  pub async fn this_week(&self, media: MediaType, page: u32) -> Result<Page<Title>> {
    self.window(ReleaseWindow::ThisWeek, media, page).await
  }

  /// Titles releasing later than next week.
  pub async fn upcoming(&self, media: MediaType, page: u32) -> Result<Page<Title>> {
    self.window(ReleaseWindow::Upcoming, media, page).await
  }

  async fn window(&self, window: ReleaseWindow, media: MediaType, page: u32) -> Result<Page<Title>> {
    let fetch = || self.inner.discover(media, Listing::Window(window), page);

    // Deeper pages are never cached
    match CatalogKey::window_page(window, media, page) {
      Some(key) => Ok(self.cache.fetch_paged(&key, fetch).await?.data),
      None => fetch().await,
    }
  }

  pub async fn by_genre(&self, media: MediaType, genre_id: u64, page: u32) -> Result<Vec<Title>> {
    let fetch = || self.inner.discover(media, Listing::Genre(genre_id), page);

    let page = match CatalogKey::genre_page(media, genre_id, page) {
      Some(key) => self.cache.fetch_paged(&key, fetch).await?.data,
      None => fetch().await?,
    };
    Ok(page.items)
  }

  pub async fn detail(&self, media: MediaType, id: u64) -> Result<TitleDetail> {
    let key = CatalogKey::Detail { media, id };
    let result = self
      .cache
      .fetch(&key, || self.inner.detail(media, id))
      .await?;

    Ok(result.data)
  }

  pub async fn cast(&self, media: MediaType, id: u64) -> Result<Vec<CastMember>> {
    let key = CatalogKey::Cast { media, id };
    let result = self
      .cache
      .fetch(&key, || async { self.inner.credits(media, id).await.map(|c| c.cast) })
      .await?;

    Ok(result.data)
  }

  pub async fn crew(&self, media: MediaType, id: u64) -> Result<Vec<CrewMember>> {
    let key = CatalogKey::Crew { media, id };
    let result = self
      .cache
      .fetch(&key, || async { self.inner.credits(media, id).await.map(|c| c.crew) })
      .await?;

    Ok(result.data)
  }

  pub async fn reviews(&self, media: MediaType, id: u64) -> Result<Vec<Review>> {
    let key = CatalogKey::Reviews { media, id };
    let result = self
      .cache
      .fetch(&key, || self.inner.reviews(media, id))
      .await?;

    Ok(result.data)
  }

  pub async fn person(&self, id: u64) -> Result<Person> {
    let result = self
      .cache
      .fetch(&CatalogKey::Person { id }, || self.inner.person(id))
      .await?;

    Ok(result.data)
  }

  pub async fn filmography(&self, id: u64) -> Result<Vec<Title>> {
    let result = self
      .cache
      .fetch(&CatalogKey::Filmography { id }, || self.inner.filmography(id))
      .await?;

    Ok(result.data)
  }

  /// Search titles (not cached - free-text queries rarely repeat).
  pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
    self.inner.search(query).await
  }

  /// Upcoming movies and series grouped by release day.
  pub async fn schedule(&self, page: u32) -> Result<Vec<ScheduleDay>> {
    let (movies, tv) = tokio::join!(
      self.upcoming(MediaType::Movie, page),
      self.upcoming(MediaType::Tv, page),
    );

    let titles = merge_sides(movies.map(|p| p.items), tv.map(|p| p.items), "schedule")?;
    Ok(group_by_release_date(titles, self.cache.now().date_naive()))
  }

  /// Movies and series of one genre, without duplicates.
  pub async fn genre_mix(&self, genre_id: u64, page: u32) -> Result<Vec<Title>> {
    let (movies, tv) = tokio::join!(
      self.by_genre(MediaType::Movie, genre_id, page),
      self.by_genre(MediaType::Tv, genre_id, page),
    );

    let mut titles = merge_sides(movies, tv, "genre mix")?;
    let mut seen = HashSet::new();
    titles.retain(|t| seen.insert((t.media_type, t.id)));
    Ok(titles)
  }

  /// Clear one table, or every table when none is given.
  pub fn clear_cache(&self, table: Option<CacheTable>) -> Result<()> {
    match table {
      Some(table) => self.cache.clear(table),
      None => CacheTable::ALL.into_iter().try_for_each(|t| self.cache.clear(t)),
    }
  }

  pub fn cache_stats(&self) -> Result<Vec<(CacheTable, usize)>> {
    self.cache.stats()
  }
}

/// Concatenate the movie and series halves of a combined listing. One
/// failing half is logged and skipped; both failing is an error.
fn merge_sides(
  movies: Result<Vec<Title>>,
  tv: Result<Vec<Title>>,
  what: &str,
) -> Result<Vec<Title>> {
  match (movies, tv) {
    (Ok(mut movies), Ok(tv)) => {
      movies.extend(tv);
      Ok(movies)
    }
    (Ok(titles), Err(e)) | (Err(e), Ok(titles)) => {
      warn!(error = %e, "Partial {} results", what);
      Ok(titles)
    }
    (Err(movies), Err(tv)) => {
      warn!(error = %tv, "Series {} failed", what);
      Err(movies)
    }
  }
}

/// Group titles by release day, earliest first. Titles without a valid
/// date or released before `today` are dropped.
pub fn group_by_release_date(titles: Vec<Title>, today: NaiveDate) -> Vec<ScheduleDay> {
  let mut days: BTreeMap<NaiveDate, Vec<Title>> = BTreeMap::new();
  for title in titles {
    if let Some(date) = title.release_date().filter(|d| *d >= today) {
      days.entry(date).or_default().push(title);
    }
  }

  days
    .into_iter()
    .map(|(date, titles)| ScheduleDay { date, titles })
    .collect()
}
