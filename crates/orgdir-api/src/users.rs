//! Handlers for `/users`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use orgdir_core::user::User;
use orgdir_directory::{Directory, SnapshotLoader};

use crate::{error::ApiError, ready};

/// `GET /users`: every user, enrichment merged.
pub async fn list<L: SnapshotLoader>(
  State(directory): State<Arc<Directory<L>>>,
) -> Result<Json<Vec<User>>, ApiError> {
  let snapshot = ready(&directory)?;
  Ok(Json(snapshot.users.clone()))
}

/// `GET /users/{id}`
pub async fn get_one<L: SnapshotLoader>(
  State(directory): State<Arc<Directory<L>>>,
  Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
  let snapshot = ready(&directory)?;
  snapshot
    .find_user(&id)
    .cloned()
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("user {id}")))
}
