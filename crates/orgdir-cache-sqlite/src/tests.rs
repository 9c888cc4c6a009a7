//! Tests for `SqliteCache` against an in-memory database.

use std::{future::Future, time::Duration};

use chrono::{TimeDelta, Utc};
use orgdir_core::{
  cache::{self, CacheStore},
  department::Department,
  source::{EnrichmentSource, Page, PageSource},
  user::{EnrichmentRecord, UserProfile},
};
use orgdir_directory::{DirectoryLoader, Origin};

use crate::SqliteCache;

async fn cache() -> SqliteCache {
  SqliteCache::open_in_memory()
    .await
    .expect("in-memory cache")
}

// ─── Port behaviour ──────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_key_is_a_miss() {
  let c = cache().await;
  assert_eq!(c.get(cache::USERS).await.unwrap(), None);
}

#[tokio::test]
async fn put_then_get_returns_value() {
  let c = cache().await;
  c.put(cache::USERS, "[1,2,3]".into()).await.unwrap();
  assert_eq!(c.get(cache::USERS).await.unwrap().as_deref(), Some("[1,2,3]"));
}

#[tokio::test]
async fn put_overwrites_previous_value() {
  let c = cache().await;
  c.put(cache::DEPARTMENTS, "[]".into()).await.unwrap();
  c.put(cache::DEPARTMENTS, "[{}]".into()).await.unwrap();
  assert_eq!(
    c.get(cache::DEPARTMENTS).await.unwrap().as_deref(),
    Some("[{}]")
  );
  assert_eq!(c.keys().await.unwrap(), vec![cache::DEPARTMENTS.to_string()]);
}

#[tokio::test]
async fn clear_removes_only_that_key() {
  let c = cache().await;
  c.put(cache::DEPARTMENTS, "[]".into()).await.unwrap();
  c.put(cache::USERS, "[]".into()).await.unwrap();

  c.clear(cache::USERS).await.unwrap();
  assert_eq!(c.get(cache::USERS).await.unwrap(), None);
  assert!(c.get(cache::DEPARTMENTS).await.unwrap().is_some());

  // Clearing twice is fine.
  c.clear(cache::USERS).await.unwrap();
}

#[tokio::test]
async fn expired_entries_are_misses() {
  let c = cache().await.with_max_age(Duration::from_secs(60));
  c.backdate(cache::USERS, "[]".into(), Utc::now() - TimeDelta::minutes(5))
    .await
    .unwrap();
  c.put(cache::DEPARTMENTS, "[]".into()).await.unwrap();

  assert_eq!(c.get(cache::USERS).await.unwrap(), None);
  assert!(c.get(cache::DEPARTMENTS).await.unwrap().is_some());
}

#[tokio::test]
async fn without_max_age_old_entries_stay_valid() {
  let c = cache().await;
  c.backdate(cache::USERS, "[]".into(), Utc::now() - TimeDelta::days(365))
    .await
    .unwrap();
  assert!(c.get(cache::USERS).await.unwrap().is_some());
}

#[tokio::test]
async fn file_backed_cache_survives_reopen() {
  let dir = std::env::temp_dir().join(format!("orgdir-cache-{}", std::process::id()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("cache.sqlite");

  {
    let c = SqliteCache::open(&path).await.unwrap();
    c.put(cache::USERS, "[\"kept\"]".into()).await.unwrap();
  }
  let c = SqliteCache::open(&path).await.unwrap();
  assert_eq!(c.get(cache::USERS).await.unwrap().as_deref(), Some("[\"kept\"]"));

  std::fs::remove_dir_all(&dir).ok();
}

// ─── With the directory loader ───────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("never fails")]
struct Never;

struct Fixed<T>(Vec<T>);

impl<T: Clone + Send + Sync> PageSource for Fixed<T> {
  type Record = T;
  type Error = Never;

  fn fetch_page(
    &self,
    start: usize,
    count: usize,
  ) -> impl Future<Output = Result<Page<T>, Never>> + Send + '_ {
    let end = (start + count).min(self.0.len());
    let result = self.0.get(start..end).unwrap_or_default().to_vec();
    std::future::ready(Ok(Page { result }))
  }
}

struct NoEnrichment;

impl EnrichmentSource for NoEnrichment {
  type Error = Never;

  fn fetch_all(&self) -> impl Future<Output = Result<Vec<EnrichmentRecord>, Never>> + Send + '_ {
    std::future::ready(Ok(Vec::new()))
  }
}

#[tokio::test]
async fn loader_round_trips_through_sqlite() {
  let loader = DirectoryLoader::new(
    Fixed(vec![Department::new("1", "HQ"), Department::new("2", "Ops").with_parent("1")]),
    Fixed(vec![UserProfile::new("10"), UserProfile::new("11")]),
    NoEnrichment,
    cache().await,
  );

  let first = loader.load().await.unwrap();
  assert_eq!(first.users_from, Origin::Network);

  let second = loader.load().await.unwrap();
  assert_eq!(second.departments_from, Origin::Cache);
  assert_eq!(second.users_from, Origin::Cache);
  assert_eq!(second.department_count(), 2);
  assert_eq!(second.users, first.users);

  let raw = loader.cache().get(cache::USERS).await.unwrap().unwrap();
  let users: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
  assert_eq!(users.len(), 2);
}
