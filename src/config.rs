use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::tmdb::types::CuratedItem;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub tmdb: TmdbConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub log: LogConfig,
  /// Replaces the built-in editor's picks when set
  pub editors_picks: Option<Vec<CuratedItem>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TmdbConfig {
  /// API root, e.g. "https://api.themoviedb.org/3/"
  pub url: String,
  /// Image CDN root, e.g. "https://image.tmdb.org/t/p/"
  pub image_url: String,
  /// Original-language filter for discover listings ("en|hi|ta")
  pub languages: Option<String>,
  /// ISO 3166-1 region for movie release dates
  pub region: Option<String>,
  /// Per-request timeout
  pub timeout_secs: u64,
}

impl Default for TmdbConfig {
  fn default() -> Self {
    Self {
      url: "https://api.themoviedb.org/3/".to_string(),
      image_url: "https://image.tmdb.org/t/p/".to_string(),
      languages: None,
      region: None,
      timeout_secs: 15,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// Disable to always go to the network
  pub enabled: bool,
  /// Database location (defaults to $XDG_DATA_HOME/marquee/cache.db)
  pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      path: None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
  /// Filter directive used when MARQUEE_LOG is unset
  pub level: String,
  /// Log directory (defaults to $XDG_DATA_HOME/marquee/logs)
  pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      dir: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./marquee.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/marquee/config.yaml
  ///
  /// Every setting has a default, so a missing file yields the default config.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("marquee.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("marquee").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    // An empty file is a valid, all-default config
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents).map_err(|e| eyre!("{}", e))
  }

  /// Get the TMDB API read access token from environment variables.
  ///
  /// Checks MARQUEE_TMDB_TOKEN first, then TMDB_API_TOKEN as fallback.
  pub fn get_api_token() -> Result<String> {
    std::env::var("MARQUEE_TMDB_TOKEN")
      .or_else(|_| std::env::var("TMDB_API_TOKEN"))
      .map_err(|_| {
        eyre!(
          "TMDB API token not found. Set MARQUEE_TMDB_TOKEN or TMDB_API_TOKEN environment variable."
        )
      })
  }
}
