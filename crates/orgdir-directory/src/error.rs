//! Error type for directory loads.

use thiserror::Error;

use crate::snapshot::Resource;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum LoadError {
  /// A catalog page could not be fetched; the resource load was abandoned.
  #[error("failed to fetch {resource} page at offset {start}: {source}")]
  Page {
    resource: Resource,
    start:    usize,
    #[source]
    source:   BoxError,
  },

  /// A cache entry could not be invalidated during a refresh.
  #[error("failed to clear cached {resource}: {source}")]
  CacheClear {
    resource: Resource,
    #[source]
    source:   BoxError,
  },

  /// The load task panicked or was cancelled before it produced a result.
  #[error("directory load interrupted: {0}")]
  Interrupted(String),
}
