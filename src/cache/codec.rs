//! Payload serialization for cache entries.

use color_eyre::{eyre::eyre, Result};
use serde::{de::DeserializeOwned, Serialize};

/// JSON codec shared by every cache operation of a [`CacheLayer`](super::CacheLayer).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
  pub fn encode<T: Serialize>(&self, value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| eyre!("Failed to serialize cache payload: {}", e))
  }

  pub fn decode<T: DeserializeOwned>(&self, payload: &str) -> Result<T> {
    serde_json::from_str(payload).map_err(|e| eyre!("Failed to deserialize cache payload: {}", e))
  }
}
