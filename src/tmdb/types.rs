use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Kind of title in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
  Movie,
  Tv,
}

impl MediaType {
  /// Path segment used by the catalog API ("movie" / "tv").
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Movie => "movie",
      Self::Tv => "tv",
    }
  }
}

/// Title summary for list views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
  pub id: u64,
  pub title: String,
  /// Release year, "N/A" when unknown
  pub year: String,
  pub poster_url: Option<String>,
  pub backdrop_url: Option<String>,
  /// ISO date (YYYY-MM-DD), empty when unknown
  #[serde(default)]
  pub release_date: String,
  pub media_type: MediaType,
}

impl Title {
  pub fn release_date(&self) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&self.release_date, "%Y-%m-%d").ok()
  }
}

/// Full title details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleDetail {
  pub id: u64,
  pub title: String,
  pub media_type: MediaType,
  pub poster_url: Option<String>,
  pub backdrop_url: Option<String>,
  pub country: String,
  pub language: String,
  /// Directors for movies, creators for series
  pub directors: Vec<Director>,
  /// "2h 30m" for movies, "42 min avg" for series
  pub runtime: String,
  pub synopsis: String,
  /// Audience score in percent
  pub rating: u8,
  pub trailer: Option<Trailer>,
  #[serde(default)]
  pub genres: Vec<Genre>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Director {
  pub id: u64,
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trailer {
  /// YouTube video id
  pub key: String,
  pub name: String,
  pub thumbnail_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
  pub id: u64,
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastMember {
  pub id: u64,
  pub name: String,
  pub character: String,
  pub profile_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewMember {
  pub id: u64,
  pub name: String,
  pub job: String,
  pub profile_url: Option<String>,
}

/// Cast and crew of a title
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Credits {
  pub cast: Vec<CastMember>,
  pub crew: Vec<CrewMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
  pub id: String,
  pub author: String,
  pub content: String,
  /// Percent, None when the reviewer didn't rate
  pub rating: Option<u8>,
  pub avatar_url: Option<String>,
  pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub id: u64,
  pub name: String,
  pub biography: Option<String>,
  pub profile_url: Option<String>,
  pub birthday: Option<String>,
  pub place_of_birth: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
  pub id: u64,
  pub title: String,
  pub year: String,
  pub media_type: MediaType,
  pub popularity: f64,
}

/// Titles releasing on one day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleDay {
  pub date: NaiveDate,
  pub titles: Vec<Title>,
}

/// Release windows used by the dated listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReleaseWindow {
  /// Released within the last 30 days
  Previous,
  /// Releasing within the next 7 days
  ThisWeek,
  /// Releasing from 8 days out
  Upcoming,
}

/// What a discover query lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
  Window(ReleaseWindow),
  Genre(u64),
}

/// Hand-picked title shown in the editor's picks row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CuratedItem {
  pub id: u64,
  pub media_type: MediaType,
}
