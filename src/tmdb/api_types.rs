//! Serde-deserializable types matching TMDB API responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use serde::Deserialize;
use std::collections::HashSet;

use super::types::{
  CastMember, Credits, CrewMember, Director, Genre, MediaType, Person, Review, SearchResult,
  Title, TitleDetail, Trailer,
};
use crate::cache::Page;

// ============================================================================
// Listing responses
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiListResponse<T> {
  #[serde(default = "first_page")]
  pub page: u32,
  #[serde(default = "Vec::new")]
  pub results: Vec<T>,
  #[serde(default = "first_page")]
  pub total_pages: u32,
}

fn first_page() -> u32 {
  1
}

#[derive(Debug, Deserialize)]
pub struct ApiMovie {
  pub id: u64,
  #[serde(default)]
  pub title: String,
  pub poster_path: Option<String>,
  pub backdrop_path: Option<String>,
  pub release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiTvShow {
  pub id: u64,
  #[serde(default)]
  pub name: String,
  pub poster_path: Option<String>,
  pub backdrop_path: Option<String>,
  pub first_air_date: Option<String>,
}

/// Entry of a mixed listing (trending, search, person credits)
#[derive(Debug, Deserialize)]
pub struct ApiMixedItem {
  pub id: u64,
  #[serde(default)]
  pub media_type: String,
  pub title: Option<String>,
  pub name: Option<String>,
  pub poster_path: Option<String>,
  pub backdrop_path: Option<String>,
  pub release_date: Option<String>,
  pub first_air_date: Option<String>,
  #[serde(default)]
  pub popularity: f64,
}

// ============================================================================
// Detail responses
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiGenre {
  pub id: u64,
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiCountry {
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiLanguage {
  #[serde(default)]
  pub english_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiCreator {
  pub id: u64,
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiMovieDetail {
  pub id: u64,
  pub title: String,
  pub overview: Option<String>,
  pub poster_path: Option<String>,
  pub backdrop_path: Option<String>,
  /// Minutes
  pub runtime: Option<u32>,
  #[serde(default)]
  pub production_countries: Vec<ApiCountry>,
  #[serde(default)]
  pub spoken_languages: Vec<ApiLanguage>,
  #[serde(default)]
  pub vote_average: f64,
  #[serde(default)]
  pub genres: Vec<ApiGenre>,
}

#[derive(Debug, Deserialize)]
pub struct ApiTvDetail {
  pub id: u64,
  pub name: String,
  pub overview: Option<String>,
  pub poster_path: Option<String>,
  pub backdrop_path: Option<String>,
  #[serde(default)]
  pub episode_run_time: Vec<u32>,
  #[serde(default)]
  pub production_countries: Vec<ApiCountry>,
  #[serde(default)]
  pub spoken_languages: Vec<ApiLanguage>,
  #[serde(default)]
  pub vote_average: f64,
  #[serde(default)]
  pub created_by: Vec<ApiCreator>,
  #[serde(default)]
  pub genres: Vec<ApiGenre>,
}

#[derive(Debug, Deserialize)]
pub struct ApiCastMember {
  pub id: u64,
  pub name: String,
  #[serde(default)]
  pub character: String,
  pub profile_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiCrewMember {
  pub id: u64,
  pub name: String,
  #[serde(default)]
  pub job: String,
  #[serde(default)]
  pub department: String,
  pub profile_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiCredits {
  #[serde(default)]
  pub cast: Vec<ApiCastMember>,
  #[serde(default)]
  pub crew: Vec<ApiCrewMember>,
}

#[derive(Debug, Deserialize)]
pub struct ApiVideo {
  pub key: String,
  pub name: String,
  pub site: String,
  #[serde(rename = "type")]
  pub video_type: String,
  #[serde(default)]
  pub official: bool,
}

#[derive(Debug, Deserialize)]
pub struct ApiVideos {
  #[serde(default)]
  pub results: Vec<ApiVideo>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ApiAuthorDetails {
  /// 0-10
  pub rating: Option<f64>,
  pub avatar_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiReview {
  pub id: String,
  pub author: String,
  #[serde(default)]
  pub content: String,
  #[serde(default)]
  pub created_at: String,
  #[serde(default)]
  pub author_details: ApiAuthorDetails,
}

#[derive(Debug, Deserialize)]
pub struct ApiPerson {
  pub id: u64,
  pub name: String,
  pub biography: Option<String>,
  pub profile_path: Option<String>,
  pub birthday: Option<String>,
  pub place_of_birth: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiPersonCredits {
  #[serde(default)]
  pub cast: Vec<ApiMixedItem>,
}

// ============================================================================
// Conversions to domain types
// ============================================================================

/// Builds absolute image URLs from the relative paths the API returns.
#[derive(Debug, Clone)]
pub struct Images {
  base: String,
}

impl Images {
  pub fn new(base: &str) -> Self {
    Self {
      base: base.trim_end_matches('/').to_string(),
    }
  }

  fn url(&self, size: &str, path: Option<&str>) -> Option<String> {
    let path = path.filter(|p| !p.is_empty())?;
    Some(format!("{}/{}{}", self.base, size, path))
  }

  pub fn poster(&self, path: Option<&str>) -> Option<String> {
    self.url("w500", path)
  }

  pub fn backdrop(&self, path: Option<&str>) -> Option<String> {
    self.url("w780", path)
  }

  pub fn profile(&self, path: Option<&str>) -> Option<String> {
    self.url("w185", path)
  }
}

impl<T> ApiListResponse<T> {
  pub fn into_page<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
    Page::new(
      self.results.into_iter().map(f).collect(),
      self.page,
      self.total_pages,
    )
  }
}

impl ApiMovie {
  pub fn into_title(self, images: &Images) -> Title {
    Title {
      id: self.id,
      year: year_of(self.release_date.as_deref()),
      poster_url: images.poster(self.poster_path.as_deref()),
      backdrop_url: images.backdrop(self.backdrop_path.as_deref()),
      release_date: self.release_date.unwrap_or_default(),
      title: self.title,
      media_type: MediaType::Movie,
    }
  }
}

impl ApiTvShow {
  pub fn into_title(self, images: &Images) -> Title {
    Title {
      id: self.id,
      year: year_of(self.first_air_date.as_deref()),
      poster_url: images.poster(self.poster_path.as_deref()),
      backdrop_url: images.backdrop(self.backdrop_path.as_deref()),
      release_date: self.first_air_date.unwrap_or_default(),
      title: self.name,
      media_type: MediaType::Tv,
    }
  }
}

impl ApiMixedItem {
  /// Movie or TV; None for people and anything else.
  pub fn media(&self) -> Option<MediaType> {
    match self.media_type.as_str() {
      "movie" => Some(MediaType::Movie),
      "tv" => Some(MediaType::Tv),
      _ => None,
    }
  }

  fn date(&self, media: MediaType) -> Option<&str> {
    match media {
      MediaType::Movie => self.release_date.as_deref(),
      MediaType::Tv => self.first_air_date.as_deref(),
    }
  }

  fn display_title(&self, media: MediaType) -> String {
    let (primary, fallback) = match media {
      MediaType::Movie => (&self.title, &self.name),
      MediaType::Tv => (&self.name, &self.title),
    };
    primary
      .clone()
      .or_else(|| fallback.clone())
      .unwrap_or_else(|| "Unknown".to_string())
  }

  pub fn into_title(self, images: &Images) -> Option<Title> {
    let media = self.media()?;
    let release_date = self.date(media).unwrap_or_default().to_string();
    Some(Title {
      id: self.id,
      title: self.display_title(media),
      year: year_of(Some(release_date.as_str())),
      poster_url: images.poster(self.poster_path.as_deref()),
      backdrop_url: images.backdrop(self.backdrop_path.as_deref()),
      release_date,
      media_type: media,
    })
  }

  pub fn into_search_result(self) -> Option<SearchResult> {
    let media = self.media()?;
    Some(SearchResult {
      id: self.id,
      title: self.display_title(media),
      year: year_of(self.date(media)),
      media_type: media,
      popularity: self.popularity,
    })
  }
}

impl ApiMovieDetail {
  pub fn into_detail(self, credits: &ApiCredits, videos: &ApiVideos, images: &Images) -> TitleDetail {
    let directors = credits
      .crew
      .iter()
      .filter(|c| c.job == "Director")
      .map(|c| Director {
        id: c.id,
        name: c.name.clone(),
      })
      .collect();

    TitleDetail {
      id: self.id,
      title: self.title,
      media_type: MediaType::Movie,
      poster_url: images.poster(self.poster_path.as_deref()),
      backdrop_url: images.backdrop(self.backdrop_path.as_deref()),
      country: first_or_na(self.production_countries.into_iter().map(|c| c.name)),
      language: first_or_na(self.spoken_languages.into_iter().map(|l| l.english_name)),
      directors,
      runtime: format_movie_runtime(self.runtime),
      synopsis: synopsis(self.overview),
      rating: percent(self.vote_average),
      trailer: pick_trailer(videos),
      genres: self.genres.into_iter().map(Genre::from).collect(),
    }
  }
}

impl ApiTvDetail {
  pub fn into_detail(self, videos: &ApiVideos, images: &Images) -> TitleDetail {
    TitleDetail {
      id: self.id,
      title: self.name,
      media_type: MediaType::Tv,
      poster_url: images.poster(self.poster_path.as_deref()),
      backdrop_url: images.backdrop(self.backdrop_path.as_deref()),
      country: first_or_na(self.production_countries.into_iter().map(|c| c.name)),
      language: first_or_na(self.spoken_languages.into_iter().map(|l| l.english_name)),
      directors: self
        .created_by
        .into_iter()
        .map(|c| Director {
          id: c.id,
          name: c.name,
        })
        .collect(),
      runtime: format_tv_runtime(&self.episode_run_time),
      synopsis: synopsis(self.overview),
      rating: percent(self.vote_average),
      trailer: pick_trailer(videos),
      genres: self.genres.into_iter().map(Genre::from).collect(),
    }
  }
}

impl From<ApiGenre> for Genre {
  fn from(g: ApiGenre) -> Self {
    Genre {
      id: g.id,
      name: g.name,
    }
  }
}

/// Departments and jobs worth listing in a crew overview
const KEY_DEPARTMENTS: &[&str] = &["Directing", "Writing", "Production", "Camera", "Editing"];
const KEY_JOBS: &[&str] = &[
  "Director",
  "Writer",
  "Screenplay",
  "Producer",
  "Executive Producer",
  "Director of Photography",
  "Editor",
];

/// Top-billed cast members kept per title
const CAST_LIMIT: usize = 10;

impl ApiCredits {
  pub fn into_credits(self, images: &Images) -> Credits {
    let cast = self
      .cast
      .into_iter()
      .take(CAST_LIMIT)
      .map(|c| CastMember {
        id: c.id,
        name: c.name,
        character: c.character,
        profile_url: images.profile(c.profile_path.as_deref()),
      })
      .collect();

    // One row per person, even with several roles
    let mut seen = HashSet::new();
    let crew = self
      .crew
      .into_iter()
      .filter(|c| {
        KEY_DEPARTMENTS.contains(&c.department.as_str()) || KEY_JOBS.contains(&c.job.as_str())
      })
      .filter(|c| seen.insert(c.id))
      .map(|c| CrewMember {
        id: c.id,
        name: c.name,
        job: c.job,
        profile_url: images.profile(c.profile_path.as_deref()),
      })
      .collect();

    Credits { cast, crew }
  }
}

impl ApiReview {
  pub fn into_review(self, images: &Images) -> Review {
    let avatar_url = match self.author_details.avatar_path.as_deref() {
      // Gravatar links come through as "/https://..."
      Some(path) if path.starts_with("/http") => Some(path[1..].to_string()),
      other => images.profile(other),
    };

    Review {
      id: self.id,
      author: self.author,
      content: self.content,
      rating: self.author_details.rating.map(percent),
      avatar_url,
      created_at: self.created_at.chars().take(10).collect(),
    }
  }
}

impl ApiPerson {
  pub fn into_person(self, images: &Images) -> Person {
    Person {
      id: self.id,
      name: self.name,
      biography: self.biography.filter(|b| !b.trim().is_empty()),
      profile_url: images.poster(self.profile_path.as_deref()),
      birthday: self.birthday,
      place_of_birth: self.place_of_birth,
    }
  }
}

impl ApiPersonCredits {
  /// Titles with artwork, one per id, newest first.
  pub fn into_filmography(self, images: &Images) -> Vec<Title> {
    let mut seen = HashSet::new();
    let mut titles: Vec<Title> = self
      .cast
      .into_iter()
      .filter(|c| c.poster_path.is_some())
      .filter(|c| seen.insert(c.id))
      .filter_map(|c| c.into_title(images))
      .collect();
    titles.sort_by(|a, b| b.release_date.cmp(&a.release_date));
    titles
  }
}

// ============================================================================
// Helpers
// ============================================================================

fn year_of(date: Option<&str>) -> String {
  match date {
    Some(d) if d.len() >= 4 => d[..4].to_string(),
    _ => "N/A".to_string(),
  }
}

fn first_or_na(mut values: impl Iterator<Item = String>) -> String {
  values.next().unwrap_or_else(|| "N/A".to_string())
}

fn synopsis(overview: Option<String>) -> String {
  overview
    .filter(|o| !o.trim().is_empty())
    .unwrap_or_else(|| "No synopsis available".to_string())
}

/// 0-10 score as a rounded percentage.
fn percent(score: f64) -> u8 {
  (score * 10.0).round().clamp(0.0, 100.0) as u8
}

fn format_movie_runtime(minutes: Option<u32>) -> String {
  match minutes {
    None | Some(0) => "N/A".to_string(),
    Some(m) if m >= 60 => format!("{}h {}m", m / 60, m % 60),
    Some(m) => format!("{}m", m),
  }
}

fn format_tv_runtime(runtimes: &[u32]) -> String {
  if runtimes.is_empty() {
    return "N/A".to_string();
  }
  let total: u32 = runtimes.iter().sum();
  let avg = (f64::from(total) / runtimes.len() as f64).round();
  format!("{} min avg", avg)
}

/// Prefer an official YouTube trailer, then any YouTube trailer.
fn pick_trailer(videos: &ApiVideos) -> Option<Trailer> {
  let is_trailer = |v: &&ApiVideo| v.site == "YouTube" && v.video_type == "Trailer";
  let video = videos
    .results
    .iter()
    .filter(is_trailer)
    .find(|v| v.official)
    .or_else(|| videos.results.iter().find(is_trailer))?;

  Some(Trailer {
    key: video.key.clone(),
    name: video.name.clone(),
    thumbnail_url: format!("https://img.youtube.com/vi/{}/maxresdefault.jpg", video.key),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn images() -> Images {
    Images::new("https://image.tmdb.org/t/p/")
  }

  #[test]
  fn test_movie_listing_maps_to_titles() {
    let response: ApiListResponse<ApiMovie> = serde_json::from_value(json!({
      "page": 1,
      "total_pages": 3,
      "results": [
        {"id": 438631, "title": "Dune", "poster_path": "/d.jpg", "backdrop_path": null, "release_date": "2021-09-15"},
        {"id": 2, "title": "Untitled", "poster_path": null, "release_date": null}
      ]
    }))
    .unwrap();

    let page = response.into_page(|m| m.into_title(&images()));
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.items[0].year, "2021");
    assert_eq!(
      page.items[0].poster_url.as_deref(),
      Some("https://image.tmdb.org/t/p/w500/d.jpg")
    );
    assert_eq!(page.items[0].backdrop_url, None);
    assert_eq!(page.items[1].year, "N/A");
    assert_eq!(page.items[1].release_date, "");
  }

  #[test]
  fn test_mixed_items_skip_people() {
    let items: Vec<ApiMixedItem> = serde_json::from_value(json!([
      {"id": 1, "media_type": "tv", "name": "Start-Up", "first_air_date": "2020-10-17", "popularity": 3.0},
      {"id": 2, "media_type": "person", "name": "Someone", "popularity": 99.0},
      {"id": 3, "media_type": "movie", "title": "Dune", "release_date": "2021-09-15", "popularity": 5.0}
    ]))
    .unwrap();

    let titles: Vec<Title> = items.into_iter().filter_map(|i| i.into_title(&images())).collect();
    assert_eq!(titles.len(), 2);
    assert_eq!(titles[0].title, "Start-Up");
    assert_eq!(titles[0].media_type, MediaType::Tv);
    assert_eq!(titles[0].release_date, "2020-10-17");
    assert_eq!(titles[1].media_type, MediaType::Movie);
  }

  #[test]
  fn test_movie_detail_mapping() {
    let detail: ApiMovieDetail = serde_json::from_value(json!({
      "id": 438631,
      "title": "Dune",
      "overview": "",
      "poster_path": "/p.jpg",
      "backdrop_path": "/b.jpg",
      "runtime": 155,
      "production_countries": [{"name": "United States of America"}],
      "spoken_languages": [{"english_name": "English"}],
      "vote_average": 7.76,
      "genres": [{"id": 878, "name": "Science Fiction"}]
    }))
    .unwrap();
    let credits: ApiCredits = serde_json::from_value(json!({
      "cast": [],
      "crew": [{"id": 137427, "name": "Denis Villeneuve", "job": "Director", "department": "Directing"}]
    }))
    .unwrap();
    let videos: ApiVideos = serde_json::from_value(json!({
      "results": [
        {"key": "teaser", "name": "Teaser", "site": "YouTube", "type": "Teaser", "official": true},
        {"key": "fan", "name": "Fan cut", "site": "YouTube", "type": "Trailer", "official": false},
        {"key": "main", "name": "Main Trailer", "site": "YouTube", "type": "Trailer", "official": true}
      ]
    }))
    .unwrap();

    let detail = detail.into_detail(&credits, &videos, &images());
    assert_eq!(detail.runtime, "2h 35m");
    assert_eq!(detail.rating, 78);
    assert_eq!(detail.synopsis, "No synopsis available");
    assert_eq!(detail.directors[0].name, "Denis Villeneuve");
    assert_eq!(detail.trailer.unwrap().key, "main");
    assert_eq!(detail.genres[0].name, "Science Fiction");
  }

  #[test]
  fn test_tv_detail_mapping() {
    let detail: ApiTvDetail = serde_json::from_value(json!({
      "id": 99048,
      "name": "Start-Up",
      "overview": "Young entrepreneurs",
      "episode_run_time": [70, 81],
      "created_by": [],
      "vote_average": 8.0
    }))
    .unwrap();
    let videos = ApiVideos { results: vec![] };

    let detail = detail.into_detail(&videos, &images());
    assert_eq!(detail.runtime, "76 min avg");
    assert_eq!(detail.country, "N/A");
    assert!(detail.directors.is_empty());
    assert_eq!(detail.trailer, None);
  }

  #[test]
  fn test_runtime_formatting() {
    assert_eq!(format_movie_runtime(None), "N/A");
    assert_eq!(format_movie_runtime(Some(0)), "N/A");
    assert_eq!(format_movie_runtime(Some(45)), "45m");
    assert_eq!(format_movie_runtime(Some(120)), "2h 0m");
    assert_eq!(format_tv_runtime(&[]), "N/A");
  }

  #[test]
  fn test_crew_keeps_key_roles_once() {
    let credits: ApiCredits = serde_json::from_value(json!({
      "cast": [],
      "crew": [
        {"id": 1, "name": "A", "job": "Director", "department": "Directing"},
        {"id": 1, "name": "A", "job": "Writer", "department": "Writing"},
        {"id": 2, "name": "B", "job": "Gaffer", "department": "Lighting"},
        {"id": 3, "name": "C", "job": "Executive Producer", "department": "Other"}
      ]
    }))
    .unwrap();

    let credits = credits.into_credits(&images());
    let ids: Vec<u64> = credits.crew.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(credits.crew[0].job, "Director");
  }

  #[test]
  fn test_cast_is_capped() {
    let cast: Vec<_> = (0..15)
      .map(|i| json!({"id": i, "name": format!("Actor {}", i), "character": "X"}))
      .collect();
    let credits: ApiCredits = serde_json::from_value(json!({ "cast": cast })).unwrap();
    assert_eq!(credits.into_credits(&images()).cast.len(), CAST_LIMIT);
  }

  #[test]
  fn test_review_mapping() {
    let review: ApiReview = serde_json::from_value(json!({
      "id": "abc",
      "author": "critic",
      "content": "Great",
      "created_at": "2021-10-22T10:00:00.000Z",
      "author_details": {"rating": 8.5, "avatar_path": "/https://www.gravatar.com/avatar/x.jpg"}
    }))
    .unwrap();

    let review = review.into_review(&images());
    assert_eq!(review.rating, Some(85));
    assert_eq!(review.created_at, "2021-10-22");
    assert_eq!(
      review.avatar_url.as_deref(),
      Some("https://www.gravatar.com/avatar/x.jpg")
    );
  }

  #[test]
  fn test_filmography_filters_and_sorts() {
    let credits: ApiPersonCredits = serde_json::from_value(json!({
      "cast": [
        {"id": 1, "media_type": "movie", "title": "Old", "poster_path": "/o.jpg", "release_date": "2001-01-01"},
        {"id": 2, "media_type": "tv", "name": "New", "poster_path": "/n.jpg", "first_air_date": "2022-05-05"},
        {"id": 1, "media_type": "movie", "title": "Old", "poster_path": "/o.jpg", "release_date": "2001-01-01"},
        {"id": 3, "media_type": "movie", "title": "No art", "poster_path": null, "release_date": "2023-01-01"}
      ]
    }))
    .unwrap();

    let titles = credits.into_filmography(&images());
    let ids: Vec<u64> = titles.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![2, 1]);
  }

  #[test]
  fn test_blank_biography_is_none() {
    let person: ApiPerson = serde_json::from_value(json!({
      "id": 5, "name": "P", "biography": "  ", "profile_path": null
    }))
    .unwrap();
    assert_eq!(person.into_person(&images()).biography, None);
  }
}
