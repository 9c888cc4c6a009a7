//! Cache-aware loading of both catalogs.
//!
//! For each resource the loader reads the cache first and uses a cached
//! snapshot verbatim. On a miss it drains the paginated source, and for users
//! also fetches the enrichment set and merges it, then writes the result back
//! to the cache before returning it.
//!
//! Failure policy:
//!
//! - A failed page fetch aborts the load. Pages already fetched for that
//!   resource are dropped, never cached.
//! - A failed enrichment fetch is logged and the users load continues with
//!   every user unenriched.
//! - Unreadable or corrupt cache entries count as misses; corrupt entries are
//!   purged. Failed cache writes are logged and the load still succeeds.

use std::{future::Future, num::NonZeroUsize};

use chrono::Utc;
use orgdir_core::{
  cache::{self, CacheStore},
  department::Department,
  hierarchy, merge,
  source::{EnrichmentSource, PageSource},
  user::{User, UserProfile},
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

use crate::{
  error::LoadError,
  snapshot::{Origin, Resource, Snapshot},
};

/// Default number of records requested per catalog page.
pub const DEFAULT_PAGE_SIZE: NonZeroUsize = match NonZeroUsize::new(50) {
  Some(n) => n,
  None => unreachable!(),
};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Anything that can produce a [`Snapshot`]; implemented by
/// [`DirectoryLoader`] and by fakes in tests.
pub trait SnapshotLoader: Send + Sync {
  /// Load using the cache where possible.
  fn load(&self) -> impl Future<Output = Result<Snapshot, LoadError>> + Send + '_;

  /// Invalidate the cache, then load from the sources.
  fn refresh(&self) -> impl Future<Output = Result<Snapshot, LoadError>> + Send + '_;
}

// ─── Loader ──────────────────────────────────────────────────────────────────

/// Loads departments and users from their sources through a cache.
#[derive(Debug)]
pub struct DirectoryLoader<D, U, E, C> {
  departments: D,
  users:       U,
  enrichment:  E,
  cache:       C,
  page_size:   NonZeroUsize,
}

impl<D, U, E, C> DirectoryLoader<D, U, E, C>
where
  D: PageSource<Record = Department>,
  U: PageSource<Record = UserProfile>,
  E: EnrichmentSource,
  C: CacheStore,
{
  pub fn new(departments: D, users: U, enrichment: E, cache: C) -> Self {
    Self {
      departments,
      users,
      enrichment,
      cache,
      page_size: DEFAULT_PAGE_SIZE,
    }
  }

  pub fn with_page_size(mut self, page_size: NonZeroUsize) -> Self {
    self.page_size = page_size;
    self
  }

  pub fn cache(&self) -> &C { &self.cache }

  /// Load both resources concurrently. Both must succeed.
  pub async fn load(&self) -> Result<Snapshot, LoadError> {
    let ((departments, departments_from), (users, users_from)) =
      tokio::try_join!(self.load_departments(), self.load_users())?;

    let forest = hierarchy::build(departments);
    if !forest.duplicate_ids.is_empty() {
      warn!(
        ids = ?forest.duplicate_ids,
        "duplicate department ids; the last record of each id was kept"
      );
    }

    let snapshot = Snapshot {
      departments: forest.roots,
      users,
      departments_from,
      users_from,
      loaded_at: Utc::now(),
    };
    info!(
      departments = snapshot.department_count(),
      users = snapshot.users.len(),
      %departments_from,
      %users_from,
      "directory loaded"
    );
    Ok(snapshot)
  }

  /// Clear both cache entries, then load from the sources.
  pub async fn refresh(&self) -> Result<Snapshot, LoadError> {
    self.invalidate().await?;
    self.load().await
  }

  /// Clear both cache entries.
  pub async fn invalidate(&self) -> Result<(), LoadError> {
    for resource in [Resource::Departments, Resource::Users] {
      self
        .cache
        .clear(resource.cache_key())
        .await
        .map_err(|e| LoadError::CacheClear {
          resource,
          source: Box::new(e),
        })?;
    }
    info!("directory cache cleared");
    Ok(())
  }

  async fn load_departments(&self) -> Result<(Vec<Department>, Origin), LoadError> {
    let resource = Resource::Departments;
    if let Some(cached) = self.read_cache(resource).await {
      return Ok((cached, Origin::Cache));
    }
    let departments = drain(&self.departments, resource, self.page_size).await?;
    self.write_cache(resource, &departments).await;
    Ok((departments, Origin::Network))
  }

  async fn load_users(&self) -> Result<(Vec<User>, Origin), LoadError> {
    let resource = Resource::Users;
    if let Some(cached) = self.read_cache(resource).await {
      return Ok((cached, Origin::Cache));
    }
    let profiles = drain(&self.users, resource, self.page_size).await?;
    let records = match self.enrichment.fetch_all().await {
      Ok(records) => records,
      Err(e) => {
        warn!(error = %e, "enrichment fetch failed; continuing without enrichment");
        Vec::new()
      }
    };

    let base: Vec<User> = profiles.into_iter().map(User::from).collect();
    let users = merge::merge(&base, &records);
    debug!(
      users = users.len(),
      enriched = merge::enriched_count(&users),
      records = records.len(),
      "enrichment merged"
    );

    self.write_cache(resource, &users).await;
    Ok((users, Origin::Network))
  }

  /// Read and decode a cache entry. Any failure is a miss.
  async fn read_cache<T: DeserializeOwned>(&self, resource: Resource) -> Option<Vec<T>> {
    let key = resource.cache_key();
    let raw = match self.cache.get(key).await {
      Ok(Some(raw)) => raw,
      Ok(None) => return None,
      Err(e) => {
        warn!(%resource, error = %e, "cache read failed; loading from source");
        return None;
      }
    };

    match cache::decode(key, &raw) {
      Ok(records) => {
        info!(%resource, "using cached data");
        Some(records)
      }
      Err(e) => {
        warn!(%resource, error = %e, "discarding corrupt cache entry");
        if let Err(e) = self.cache.clear(key).await {
          warn!(%resource, error = %e, "failed to purge corrupt cache entry");
        }
        None
      }
    }
  }

  async fn write_cache<T: Serialize>(&self, resource: Resource, records: &[T]) {
    let key = resource.cache_key();
    let result = match cache::encode(records) {
      Ok(raw) => self.cache.put(key, raw).await.map_err(|e| e.to_string()),
      Err(e) => Err(e.to_string()),
    };
    if let Err(error) = result {
      warn!(%resource, %error, "failed to write cache entry");
    }
  }
}

impl<D, U, E, C> SnapshotLoader for DirectoryLoader<D, U, E, C>
where
  D: PageSource<Record = Department>,
  U: PageSource<Record = UserProfile>,
  E: EnrichmentSource,
  C: CacheStore,
{
  fn load(&self) -> impl Future<Output = Result<Snapshot, LoadError>> + Send + '_ {
    DirectoryLoader::load(self)
  }

  fn refresh(&self) -> impl Future<Output = Result<Snapshot, LoadError>> + Send + '_ {
    DirectoryLoader::refresh(self)
  }
}

// ─── Pagination ──────────────────────────────────────────────────────────────

/// Request successive pages until one comes back short, concatenating them
/// in offset order. There is no upper bound on the number of pages.
pub async fn drain<S: PageSource>(
  source: &S,
  resource: Resource,
  page_size: NonZeroUsize,
) -> Result<Vec<S::Record>, LoadError> {
  let count = page_size.get();
  let mut records = Vec::new();
  let mut start = 0;
  let mut pages = 0usize;

  loop {
    let page = source
      .fetch_page(start, count)
      .await
      .map_err(|e| LoadError::Page {
        resource,
        start,
        source: Box::new(e),
      })?;
    pages += 1;
    let fetched = page.result.len();
    records.extend(page.result);

    if fetched < count {
      break;
    }
    start += count;
  }

  debug!(%resource, pages, records = records.len(), "catalog drained");
  Ok(records)
}
