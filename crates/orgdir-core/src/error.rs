//! Error types for `orgdir-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("cache entry {key:?} is corrupt: {source}")]
  CorruptEntry {
    key:    String,
    #[source]
    source: serde_json::Error,
  },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
