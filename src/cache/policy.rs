//! Freshness policy: how long each kind of content stays fresh.

use chrono::{DateTime, Duration, Utc};

/// Content category that determines a cached entry's time-to-live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
  Trending,
  EditorsPicks,
  /// Titles released in the last 30 days
  Previous,
  ThisWeek,
  Upcoming,
  Genre,
  Detail,
  Credits,
  Reviews,
  Person,
  Filmography,
}

impl Category {
  /// Time-to-live for entries of this category.
  ///
  /// Volatile listings expire within hours; people data barely changes.
  pub fn ttl(self) -> Duration {
    match self {
      Self::Trending => Duration::hours(1),
      Self::EditorsPicks => Duration::hours(24),
      Self::Previous => Duration::hours(3),
      Self::ThisWeek => Duration::hours(6),
      Self::Upcoming => Duration::hours(6),
      Self::Genre => Duration::hours(3),
      Self::Detail => Duration::hours(24),
      Self::Credits => Duration::hours(24),
      Self::Reviews => Duration::hours(6),
      Self::Person => Duration::days(7),
      Self::Filmography => Duration::days(7),
    }
  }
}

/// An entry is expired once strictly more than `ttl` has passed since it was written.
pub fn is_expired(cached_at: DateTime<Utc>, ttl: Duration, now: DateTime<Utc>) -> bool {
  now - cached_at > ttl
}
