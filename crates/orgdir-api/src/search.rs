//! Handler for `GET /search`.
//!
//! Runs the query immediately; debouncing is a client concern.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use orgdir_core::search::{self, SearchHit};
use orgdir_directory::{Directory, SnapshotLoader};
use serde::Deserialize;
use tracing::debug;

use crate::{error::ApiError, ready};

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  /// Name fragment, or an all-digit user ID.
  #[serde(default)]
  pub q: String,
}

/// `GET /search?q=...`
pub async fn handler<L: SnapshotLoader>(
  State(directory): State<Arc<Directory<L>>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchHit>>, ApiError> {
  let snapshot = ready(&directory)?;
  let hits = search::search_raw(&params.q, &snapshot.departments, &snapshot.users);
  debug!(query = %params.q, hits = hits.len(), "search");
  Ok(Json(hits))
}
