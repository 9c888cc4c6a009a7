//! Wiring for the org directory HTTP server.
//!
//! [`ServerConfig`] is read by the `server` binary from `config.toml` and
//! `ORGDIR_*` environment variables; [`build_directory`] turns it into a
//! [`Directory`] over the CRM and a SQLite cache, and [`app`] wraps the API
//! router with request tracing.

use std::{
  num::NonZeroUsize,
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use axum::Router;
use orgdir_cache_sqlite::SqliteCache;
use orgdir_core::{department::Department, user::UserProfile};
use orgdir_crm::{CatalogSource, CrmClient, CrmConfig, EnrichmentClient};
use orgdir_directory::{Directory, DirectoryLoader, loader::DEFAULT_PAGE_SIZE};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  #[serde(default = "default_cache_path")]
  pub cache_path:         PathBuf,
  /// Cached catalogs older than this are reloaded. Unset means no expiry.
  #[serde(default)]
  pub cache_max_age_secs: Option<u64>,
  #[serde(default = "default_page_size")]
  pub page_size:          NonZeroUsize,
  pub crm:                CrmSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CrmSettings {
  pub departments_url: String,
  pub users_url:       String,
  pub enrichment_url:  String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs:    u64,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }
fn default_cache_path() -> PathBuf { PathBuf::from("orgdir-cache.sqlite") }
fn default_page_size() -> NonZeroUsize { DEFAULT_PAGE_SIZE }
fn default_timeout_secs() -> u64 { CrmConfig::DEFAULT_TIMEOUT.as_secs() }

impl ServerConfig {
  /// Layer the optional TOML file at `path` under `ORGDIR_*` variables.
  /// Nested keys use `__`, e.g. `ORGDIR_CRM__USERS_URL`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("ORGDIR")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .context("failed to read config")?;
    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn crm(&self) -> CrmConfig {
    CrmConfig {
      departments_url: self.crm.departments_url.clone(),
      users_url:       self.crm.users_url.clone(),
      enrichment_url:  self.crm.enrichment_url.clone(),
      timeout:         Duration::from_secs(self.crm.timeout_secs),
    }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Wiring ──────────────────────────────────────────────────────────────────

pub type Loader = DirectoryLoader<
  CatalogSource<Department>,
  CatalogSource<UserProfile>,
  EnrichmentClient,
  SqliteCache,
>;

/// Open the cache and connect the loader to the CRM. Nothing is fetched yet.
pub async fn build_directory(cfg: &ServerConfig) -> anyhow::Result<Arc<Directory<Loader>>> {
  let cache_path = expand_tilde(&cfg.cache_path);
  let mut cache = SqliteCache::open(&cache_path)
    .await
    .with_context(|| format!("failed to open cache at {cache_path:?}"))?;
  if let Some(secs) = cfg.cache_max_age_secs {
    cache = cache.with_max_age(Duration::from_secs(secs));
  }

  let crm = CrmClient::new(cfg.crm()).context("failed to build CRM client")?;
  let loader = DirectoryLoader::new(crm.departments(), crm.users(), crm.enrichment(), cache)
    .with_page_size(cfg.page_size);
  Ok(Arc::new(Directory::new(loader)))
}

/// The API router with HTTP request tracing.
pub fn app(directory: Arc<Directory<Loader>>) -> Router {
  orgdir_api::api_router(directory).layer(TraceLayer::new_for_http())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
