//! Built-in editor's picks.

use super::types::{CuratedItem, MediaType};

const DEFAULT_PICKS: [(u64, MediaType); 8] = [
  (80443, MediaType::Tv),
  (126301, MediaType::Tv),
  (99048, MediaType::Tv),
  (60863, MediaType::Tv),
  (212333, MediaType::Tv),
  (438631, MediaType::Movie),
  (670292, MediaType::Movie),
  (373571, MediaType::Movie),
];

/// Curated titles used when the configuration doesn't name its own.
pub fn default_picks() -> Vec<CuratedItem> {
  DEFAULT_PICKS
    .iter()
    .map(|&(id, media_type)| CuratedItem { id, media_type })
    .collect()
}
