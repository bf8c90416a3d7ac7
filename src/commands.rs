//! Command-line commands and their dispatch.

use clap::{Subcommand, ValueEnum};
use color_eyre::{eyre::eyre, Result};
use serde::Serialize;
use serde_json::json;

use crate::cache::CacheTable;
use crate::tmdb::cached_client::CachedCatalog;
use crate::tmdb::client::Catalog;
use crate::tmdb::types::MediaType;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
  /// Trending titles this week
  Trending,
  /// Editor's picks
  Picks,
  /// Dated listings
  List {
    window: Window,
    #[arg(short, long, value_enum, default_value_t = Media::Movie)]
    media: Media,
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,
  },
  /// Titles of one genre
  Genre {
    id: u64,
    #[arg(short, long, value_enum, default_value_t = GenreMedia::Movie)]
    media: GenreMedia,
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,
  },
  /// Upcoming releases grouped by day
  Schedule {
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,
  },
  /// Full details of a title
  Detail {
    id: u64,
    #[arg(short, long, value_enum, default_value_t = Media::Movie)]
    media: Media,
  },
  Cast {
    id: u64,
    #[arg(short, long, value_enum, default_value_t = Media::Movie)]
    media: Media,
  },
  Crew {
    id: u64,
    #[arg(short, long, value_enum, default_value_t = Media::Movie)]
    media: Media,
  },
  Reviews {
    id: u64,
    #[arg(short, long, value_enum, default_value_t = Media::Movie)]
    media: Media,
  },
  Person {
    id: u64,
  },
  /// Titles a person appeared in or worked on
  Filmography {
    id: u64,
  },
  /// Search movies and series (never cached)
  Search {
    query: String,
  },
  /// Inspect or clear the local cache
  Cache {
    #[command(subcommand)]
    action: CacheCommand,
  },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CacheCommand {
  /// Drop cached entries
  Clear {
    /// Only this table (lists, details, credits, people, reviews)
    #[arg(short, long, value_parser = parse_table)]
    table: Option<CacheTable>,
  },
  /// Entry count per table
  Stats,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
  Previous,
  ThisWeek,
  Upcoming,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Media {
  Movie,
  Tv,
}

impl From<Media> for MediaType {
  fn from(media: Media) -> Self {
    match media {
      Media::Movie => MediaType::Movie,
      Media::Tv => MediaType::Tv,
    }
  }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenreMedia {
  Movie,
  Tv,
  All,
}

fn parse_table(name: &str) -> std::result::Result<CacheTable, String> {
  CacheTable::ALL
    .into_iter()
    .find(|t| t.name() == name)
    .ok_or_else(|| {
      let names: Vec<&str> = CacheTable::ALL.iter().map(|t| t.name()).collect();
      format!("unknown table '{}', expected one of: {}", name, names.join(", "))
    })
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
  serde_json::to_string_pretty(value).map_err(|e| eyre!("Failed to serialize output: {}", e))
}

/// Run a command and render its result as JSON.
pub async fn run<C: Catalog>(command: Command, catalog: &CachedCatalog<C>) -> Result<String> {
  match command {
    Command::Trending => to_json(&catalog.trending().await?),
    Command::Picks => to_json(&catalog.editors_picks().await?),
    Command::List { window, media, page } => {
      let media = media.into();
      let page = match window {
        Window::Previous => catalog.previous(media, page).await?,
        Window::ThisWeek => catalog.this_week(media, page).await?,
        Window::Upcoming => catalog.upcoming(media, page).await?,
      };
      to_json(&page)
    }
    Command::Genre { id, media, page } => {
      let titles = match media {
        GenreMedia::Movie => catalog.by_genre(MediaType::Movie, id, page).await?,
        GenreMedia::Tv => catalog.by_genre(MediaType::Tv, id, page).await?,
        GenreMedia::All => catalog.genre_mix(id, page).await?,
      };
      to_json(&titles)
    }
    Command::Schedule { page } => to_json(&catalog.schedule(page).await?),
    Command::Detail { id, media } => to_json(&catalog.detail(media.into(), id).await?),
    Command::Cast { id, media } => to_json(&catalog.cast(media.into(), id).await?),
    Command::Crew { id, media } => to_json(&catalog.crew(media.into(), id).await?),
    Command::Reviews { id, media } => to_json(&catalog.reviews(media.into(), id).await?),
    Command::Person { id } => to_json(&catalog.person(id).await?),
    Command::Filmography { id } => to_json(&catalog.filmography(id).await?),
    Command::Search { query } => to_json(&catalog.search(&query).await?),
    Command::Cache { action } => match action {
      CacheCommand::Clear { table } => {
        catalog.clear_cache(table)?;
        let cleared: Vec<&str> = match table {
          Some(table) => vec![table.name()],
          None => CacheTable::ALL.iter().map(|t| t.name()).collect(),
        };
        to_json(&json!({ "cleared": cleared }))
      }
      CacheCommand::Stats => {
        let stats: Vec<_> = catalog
          .cache_stats()?
          .into_iter()
          .map(|(table, entries)| json!({ "table": table.name(), "entries": entries }))
          .collect();
        to_json(&stats)
      }
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use clap::Parser;

  #[derive(Parser, Debug)]
  struct Cli {
    #[command(subcommand)]
    command: Command,
  }

  fn parse(args: &[&str]) -> std::result::Result<Command, clap::Error> {
    let argv = std::iter::once("marquee").chain(args.iter().copied());
    Cli::try_parse_from(argv).map(|cli| cli.command)
  }

  #[test]
  fn test_list_defaults() {
    assert_eq!(
      parse(&["list", "upcoming"]).unwrap(),
      Command::List {
        window: Window::Upcoming,
        media: Media::Movie,
        page: 1
      }
    );
  }

  #[test]
  fn test_list_with_flags() {
    assert_eq!(
      parse(&["list", "this-week", "--media", "tv", "--page", "3"]).unwrap(),
      Command::List {
        window: Window::ThisWeek,
        media: Media::Tv,
        page: 3
      }
    );
  }

  #[test]
  fn test_page_zero_is_rejected() {
    assert!(parse(&["schedule", "--page", "0"]).is_err());
  }

  #[test]
  fn test_genre_all() {
    assert_eq!(
      parse(&["genre", "16", "-m", "all"]).unwrap(),
      Command::Genre {
        id: 16,
        media: GenreMedia::All,
        page: 1
      }
    );
  }

  #[test]
  fn test_cache_clear_table() {
    assert_eq!(
      parse(&["cache", "clear", "--table", "credits"]).unwrap(),
      Command::Cache {
        action: CacheCommand::Clear {
          table: Some(CacheTable::Credits)
        }
      }
    );
    assert_eq!(
      parse(&["cache", "clear"]).unwrap(),
      Command::Cache {
        action: CacheCommand::Clear { table: None }
      }
    );
    assert!(parse(&["cache", "clear", "--table", "bogus"]).is_err());
  }

  #[test]
  fn test_search_takes_query() {
    assert_eq!(
      parse(&["search", "dune"]).unwrap(),
      Command::Search {
        query: "dune".to_string()
      }
    );
  }
}
