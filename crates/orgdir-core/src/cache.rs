//! The cache port: a small key-value store holding JSON snapshots.
//!
//! The directory caches two entries, [`DEPARTMENTS`] (the flat department
//! list) and [`USERS`] (the merged user list). Values are JSON text; the
//! store does not interpret them.

use std::{
  collections::HashMap,
  convert::Infallible,
  future::{Future, ready},
  sync::{Mutex, PoisonError},
};

use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, Result};

/// Cache key of the flat department list.
pub const DEPARTMENTS: &str = "departments";
/// Cache key of the merged user list.
pub const USERS: &str = "users";

/// Abstraction over a key-value persistence backend.
pub trait CacheStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Store `value` under `key`, replacing any previous value.
  fn put<'a>(
    &'a self,
    key: &'a str,
    value: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Fetch the value under `key`. Returns `None` on a miss.
  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  /// Remove `key`. Clearing a missing key is not an error.
  fn clear<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

/// Serialise a record list into a cache entry.
pub fn encode<T: Serialize>(records: &[T]) -> Result<String> {
  Ok(serde_json::to_string(records)?)
}

/// Parse a cache entry written by [`encode`].
///
/// Malformed JSON and JSON of the wrong shape are both reported as
/// [`Error::CorruptEntry`].
pub fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<Vec<T>> {
  serde_json::from_str(raw).map_err(|source| Error::CorruptEntry {
    key: key.to_owned(),
    source,
  })
}

// ─── In-memory backend ───────────────────────────────────────────────────────

/// A process-local [`CacheStore`]; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryCache {
  entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
  pub fn new() -> Self { Self::default() }

  /// Synchronous peek, for assertions in tests.
  pub fn contains(&self, key: &str) -> bool {
    self
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .contains_key(key)
  }

  fn with_entries<R>(&self, f: impl FnOnce(&mut HashMap<String, String>) -> R) -> R {
    f(&mut self.entries.lock().unwrap_or_else(PoisonError::into_inner))
  }
}

impl CacheStore for MemoryCache {
  type Error = Infallible;

  fn put<'a>(
    &'a self,
    key: &'a str,
    value: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a {
    self.with_entries(|e| e.insert(key.to_owned(), value));
    ready(Ok(()))
  }

  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a {
    ready(Ok(self.with_entries(|e| e.get(key).cloned())))
  }

  fn clear<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a {
    self.with_entries(|e| e.remove(key));
    ready(Ok(()))
  }
}
