//! The SQLite implementation of [`CacheStore`].

use std::{future::Future, path::Path, time::Duration};

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use orgdir_core::cache::CacheStore;
use rusqlite::OptionalExtension as _;
use tracing::debug;

use crate::{Error, Result, schema::SCHEMA};

/// A cache backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteCache {
  conn:    tokio_rusqlite::Connection,
  max_age: Option<TimeDelta>,
}

impl SqliteCache {
  /// Open (or create) a cache at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory cache, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self {
      conn,
      max_age: None,
    })
  }

  /// Treat entries older than `max_age` as misses.
  pub fn with_max_age(mut self, max_age: Duration) -> Self {
    self.max_age = Some(TimeDelta::from_std(max_age).unwrap_or(TimeDelta::MAX));
    self
  }

  /// Store `value` under `key`, stamped with the current time.
  pub async fn put_entry(&self, key: &str, value: String) -> Result<()> {
    self.put_entry_at(key, value, Utc::now()).await
  }

  async fn put_entry_at(&self, key: &str, value: String, at: DateTime<Utc>) -> Result<()> {
    let key = key.to_owned();
    let stored_at = at.to_rfc3339_opts(SecondsFormat::Micros, true);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO cache_entries (key, value, stored_at) VALUES (?1, ?2, ?3)
           ON CONFLICT(key) DO UPDATE SET value = excluded.value, stored_at = excluded.stored_at",
          rusqlite::params![key, value, stored_at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fetch the value under `key`, honouring the max age.
  pub async fn get_entry(&self, key: &str) -> Result<Option<String>> {
    let owned = key.to_owned();
    let row: Option<(String, String)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT value, stored_at FROM cache_entries WHERE key = ?1",
              rusqlite::params![owned],
              |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?,
        )
      })
      .await?;

    let Some((value, stored_at)) = row else {
      return Ok(None);
    };

    if let Some(max_age) = self.max_age {
      let stored_at = DateTime::parse_from_rfc3339(&stored_at)
        .map_err(|e| Error::DateParse(e.to_string()))?
        .with_timezone(&Utc);
      if Utc::now() - stored_at > max_age {
        debug!(key, %stored_at, "cache entry expired");
        return Ok(None);
      }
    }
    Ok(Some(value))
  }

  /// Delete the entry under `key`, if any.
  pub async fn clear_entry(&self, key: &str) -> Result<()> {
    let key = key.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM cache_entries WHERE key = ?1",
          rusqlite::params![key],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Keys currently stored, in key order.
  pub async fn keys(&self) -> Result<Vec<String>> {
    let keys = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT key FROM cache_entries ORDER BY key")?;
        let keys = stmt
          .query_map([], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
      })
      .await?;
    Ok(keys)
  }

  #[cfg(test)]
  pub(crate) async fn backdate(&self, key: &str, value: String, at: DateTime<Utc>) -> Result<()> {
    self.put_entry_at(key, value, at).await
  }
}

impl CacheStore for SqliteCache {
  type Error = Error;

  fn put<'a>(
    &'a self,
    key: &'a str,
    value: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a {
    self.put_entry(key, value)
  }

  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a {
    self.get_entry(key)
  }

  fn clear<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a {
    self.clear_entry(key)
  }
}
