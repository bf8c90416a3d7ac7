use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDate};
use color_eyre::{eyre::eyre, Result};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::cache::Page;
use crate::config::{Config, TmdbConfig};
use crate::tmdb::api_types::{
  ApiCredits, ApiListResponse, ApiMixedItem, ApiMovie, ApiMovieDetail, ApiPerson,
  ApiPersonCredits, ApiReview, ApiTvDetail, ApiTvShow, ApiVideos, Images,
};
use crate::tmdb::types::{
  Credits, Listing, MediaType, Person, ReleaseWindow, Review, SearchResult, Title, TitleDetail,
};

/// Titles kept from the trending feed
const TRENDING_LIMIT: usize = 6;
/// Results kept from a search
const SEARCH_LIMIT: usize = 20;

/// Remote catalog operations.
///
/// Implementations return domain values or fail; retries and timeouts are
/// their own business.
#[async_trait]
pub trait Catalog: Send + Sync {
  async fn trending(&self) -> Result<Vec<Title>>;

  /// Summary of a single title, looked up by id.
  async fn title(&self, media: MediaType, id: u64) -> Result<Title>;

  async fn discover(&self, media: MediaType, listing: Listing, page: u32) -> Result<Page<Title>>;

  async fn detail(&self, media: MediaType, id: u64) -> Result<TitleDetail>;

  async fn credits(&self, media: MediaType, id: u64) -> Result<Credits>;

  async fn reviews(&self, media: MediaType, id: u64) -> Result<Vec<Review>>;

  async fn person(&self, id: u64) -> Result<Person>;

  async fn filmography(&self, id: u64) -> Result<Vec<Title>>;

  async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
}

/// TMDB v3 API client
#[derive(Clone)]
pub struct TmdbClient {
  http: reqwest::Client,
  base: Url,
  token: String,
  images: Images,
  languages: Option<String>,
  region: Option<String>,
}

impl TmdbClient {
  pub fn new(config: &Config) -> Result<Self> {
    let token = Config::get_api_token()?;
    Self::with_token(&config.tmdb, token)
  }

  pub fn with_token(config: &TmdbConfig, token: String) -> Result<Self> {
    // Url::join drops the last segment unless the base ends with a slash
    let mut base = config.url.clone();
    if !base.ends_with('/') {
      base.push('/');
    }
    let base = Url::parse(&base).map_err(|e| eyre!("Invalid TMDB url {}: {}", config.url, e))?;

    let http = reqwest::Client::builder()
      .timeout(std::time::Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base,
      token,
      images: Images::new(&config.image_url),
      languages: config.languages.clone(),
      region: config.region.clone(),
    })
  }

  async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
    let url = self
      .base
      .join(path)
      .map_err(|e| eyre!("Invalid request path {}: {}", path, e))?;

    debug!(%url, "GET");
    let response = self
      .http
      .get(url)
      .bearer_auth(&self.token)
      .query(query)
      .send()
      .await
      .map_err(|e| eyre!("Request to {} failed: {}", path, e))?;

    let status = response.status();
    if !status.is_success() {
      return Err(eyre!("Request to {} returned {}", path, status));
    }

    response
      .json::<T>()
      .await
      .map_err(|e| eyre!("Failed to parse {} response: {}", path, e))
  }

  /// Query parameters for a discover listing.
  fn discover_query(
    &self,
    media: MediaType,
    listing: Listing,
    page: u32,
    today: NaiveDate,
  ) -> Vec<(&'static str, String)> {
    let (gte, lte) = match media {
      MediaType::Movie => ("primary_release_date.gte", "primary_release_date.lte"),
      MediaType::Tv => ("first_air_date.gte", "first_air_date.lte"),
    };
    let day = |offset: i64| (today + Duration::days(offset)).format("%Y-%m-%d").to_string();

    let mut query = vec![
      ("page", page.to_string()),
      ("sort_by", "popularity.desc".to_string()),
    ];

    match listing {
      Listing::Window(ReleaseWindow::Previous) => {
        query.push((gte, day(-30)));
        query.push((lte, day(0)));
        query.push(("vote_count.gte", "10".to_string()));
      }
      Listing::Window(ReleaseWindow::ThisWeek) => {
        query.push((gte, day(0)));
        query.push((lte, day(7)));
      }
      Listing::Window(ReleaseWindow::Upcoming) => {
        query.push((gte, day(8)));
      }
      Listing::Genre(genre_id) => {
        query.push(("with_genres", genre_id.to_string()));
      }
    }

    if let Listing::Window(_) = listing {
      if let Some(languages) = &self.languages {
        query.push(("with_original_language", languages.clone()));
      }
    }
    if media == MediaType::Movie {
      if let Some(region) = &self.region {
        query.push(("region", region.clone()));
      }
    }

    query
  }
}

#[async_trait]
impl Catalog for TmdbClient {
  async fn trending(&self) -> Result<Vec<Title>> {
    let response: ApiListResponse<ApiMixedItem> = self.get("trending/all/week", &[]).await?;

    Ok(
      response
        .results
        .into_iter()
        .filter_map(|item| item.into_title(&self.images))
        .take(TRENDING_LIMIT)
        .collect(),
    )
  }

  async fn title(&self, media: MediaType, id: u64) -> Result<Title> {
    let path = format!("{}/{}", media.as_str(), id);
    match media {
      MediaType::Movie => {
        let movie: ApiMovie = self.get(&path, &[]).await?;
        Ok(movie.into_title(&self.images))
      }
      MediaType::Tv => {
        let show: ApiTvShow = self.get(&path, &[]).await?;
        Ok(show.into_title(&self.images))
      }
    }
  }

  async fn discover(&self, media: MediaType, listing: Listing, page: u32) -> Result<Page<Title>> {
    let query = self.discover_query(media, listing, page, Local::now().date_naive());
    let path = format!("discover/{}", media.as_str());

    match media {
      MediaType::Movie => {
        let response: ApiListResponse<ApiMovie> = self.get(&path, &query).await?;
        Ok(response.into_page(|m| m.into_title(&self.images)))
      }
      MediaType::Tv => {
        let response: ApiListResponse<ApiTvShow> = self.get(&path, &query).await?;
        Ok(response.into_page(|s| s.into_title(&self.images)))
      }
    }
  }

  async fn detail(&self, media: MediaType, id: u64) -> Result<TitleDetail> {
    let base = format!("{}/{}", media.as_str(), id);
    let credits_path = format!("{}/credits", base);
    let videos_path = format!("{}/videos", base);

    match media {
      MediaType::Movie => {
        let (detail, credits, videos) = tokio::try_join!(
          self.get::<ApiMovieDetail>(&base, &[]),
          self.get::<ApiCredits>(&credits_path, &[]),
          self.get::<ApiVideos>(&videos_path, &[]),
        )?;
        Ok(detail.into_detail(&credits, &videos, &self.images))
      }
      MediaType::Tv => {
        let (detail, videos) = tokio::try_join!(
          self.get::<ApiTvDetail>(&base, &[]),
          self.get::<ApiVideos>(&videos_path, &[]),
        )?;
        Ok(detail.into_detail(&videos, &self.images))
      }
    }
  }

  async fn credits(&self, media: MediaType, id: u64) -> Result<Credits> {
    let path = format!("{}/{}/credits", media.as_str(), id);
    let credits: ApiCredits = self.get(&path, &[]).await?;
    Ok(credits.into_credits(&self.images))
  }

  async fn reviews(&self, media: MediaType, id: u64) -> Result<Vec<Review>> {
    let path = format!("{}/{}/reviews", media.as_str(), id);
    let response: ApiListResponse<ApiReview> = self.get(&path, &[]).await?;
    Ok(
      response
        .results
        .into_iter()
        .map(|r| r.into_review(&self.images))
        .collect(),
    )
  }

  async fn person(&self, id: u64) -> Result<Person> {
    let person: ApiPerson = self.get(&format!("person/{}", id), &[]).await?;
    Ok(person.into_person(&self.images))
  }

  async fn filmography(&self, id: u64) -> Result<Vec<Title>> {
    let path = format!("person/{}/combined_credits", id);
    let credits: ApiPersonCredits = self.get(&path, &[]).await?;
    Ok(credits.into_filmography(&self.images))
  }

  async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
    let params = [("query", query.to_string()), ("page", "1".to_string())];
    let response: ApiListResponse<ApiMixedItem> = self.get("search/multi", &params).await?;

    let mut results: Vec<SearchResult> = response
      .results
      .into_iter()
      .filter_map(ApiMixedItem::into_search_result)
      .collect();
    results.sort_by(|a, b| b.popularity.total_cmp(&a.popularity));
    results.truncate(SEARCH_LIMIT);

    Ok(results)
  }
}
