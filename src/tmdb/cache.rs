//! Cache keys for catalog queries.

use crate::cache::{CacheTable, Category, QueryKey};

use super::types::{MediaType, ReleaseWindow};

/// Query key types for catalog API calls.
///
/// Every key starts with a prefix naming what it caches, so ids from
/// different id spaces (movie 123, person 123) never share a key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogKey {
  Trending,
  EditorsPicks,
  /// First page of a dated listing
  Window {
    window: ReleaseWindow,
    media: MediaType,
  },
  /// First page of a genre listing
  Genre { media: MediaType, genre_id: u64 },
  Detail { media: MediaType, id: u64 },
  Cast { media: MediaType, id: u64 },
  Crew { media: MediaType, id: u64 },
  Reviews { media: MediaType, id: u64 },
  Person { id: u64 },
  Filmography { id: u64 },
}

impl CatalogKey {
  /// Key for a page of a dated listing. Only the first page is cached;
  /// deeper pages get no key and always go to the network.
  pub fn window_page(window: ReleaseWindow, media: MediaType, page: u32) -> Option<Self> {
    (page == 1).then_some(Self::Window { window, media })
  }

  /// Key for a page of a genre listing, first page only.
  pub fn genre_page(media: MediaType, genre_id: u64, page: u32) -> Option<Self> {
    (page == 1).then_some(Self::Genre { media, genre_id })
  }
}

/// Plural list segment ("movies" / "tv") used by listing keys.
fn list_segment(media: MediaType) -> &'static str {
  match media {
    MediaType::Movie => "movies",
    MediaType::Tv => "tv",
  }
}

fn window_prefix(window: ReleaseWindow) -> &'static str {
  match window {
    ReleaseWindow::Previous => "prev",
    ReleaseWindow::ThisWeek => "this_week",
    ReleaseWindow::Upcoming => "upcoming",
  }
}

impl QueryKey for CatalogKey {
  fn cache_key(&self) -> String {
    match self {
      Self::Trending => "trending".to_string(),
      Self::EditorsPicks => "editors_picks".to_string(),
      Self::Window { window, media } => {
        format!("{}_{}_1", window_prefix(*window), list_segment(*media))
      }
      Self::Genre { media, genre_id } => format!("genre_{}_{}_1", media.as_str(), genre_id),
      Self::Detail { media, id } => format!("detail_{}_{}", media.as_str(), id),
      Self::Cast { media, id } => format!("cast_{}_{}", media.as_str(), id),
      Self::Crew { media, id } => format!("crew_{}_{}", media.as_str(), id),
      Self::Reviews { media, id } => format!("reviews_{}_{}", media.as_str(), id),
      Self::Person { id } => format!("person_{}", id),
      Self::Filmography { id } => format!("filmography_{}", id),
    }
  }

  fn table(&self) -> CacheTable {
    match self {
      Self::Trending | Self::EditorsPicks | Self::Window { .. } | Self::Genre { .. } => {
        CacheTable::TitleLists
      }
      Self::Detail { .. } => CacheTable::Details,
      Self::Cast { .. } | Self::Crew { .. } => CacheTable::Credits,
      Self::Reviews { .. } => CacheTable::Reviews,
      Self::Person { .. } | Self::Filmography { .. } => CacheTable::People,
    }
  }

  fn category(&self) -> Category {
    match self {
      Self::Trending => Category::Trending,
      Self::EditorsPicks => Category::EditorsPicks,
      Self::Window { window, .. } => match window {
        ReleaseWindow::Previous => Category::Previous,
        ReleaseWindow::ThisWeek => Category::ThisWeek,
        ReleaseWindow::Upcoming => Category::Upcoming,
      },
      Self::Genre { .. } => Category::Genre,
      Self::Detail { .. } => Category::Detail,
      Self::Cast { .. } | Self::Crew { .. } => Category::Credits,
      Self::Reviews { .. } => Category::Reviews,
      Self::Person { .. } => Category::Person,
      Self::Filmography { .. } => Category::Filmography,
    }
  }

  fn description(&self) -> String {
    match self {
      Self::Trending => "trending titles".to_string(),
      Self::EditorsPicks => "editor's picks".to_string(),
      Self::Window { window, media } => {
        format!("{:?} {} listing", window, media.as_str())
      }
      Self::Genre { media, genre_id } => format!("{} genre {}", media.as_str(), genre_id),
      Self::Detail { media, id } => format!("{} {} detail", media.as_str(), id),
      Self::Cast { media, id } => format!("{} {} cast", media.as_str(), id),
      Self::Crew { media, id } => format!("{} {} crew", media.as_str(), id),
      Self::Reviews { media, id } => format!("{} {} reviews", media.as_str(), id),
      Self::Person { id } => format!("person {}", id),
      Self::Filmography { id } => format!("person {} filmography", id),
    }
  }
}
