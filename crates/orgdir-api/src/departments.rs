//! Handlers for `/departments`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use orgdir_core::{department::Department, search, user::User};
use orgdir_directory::{Directory, SnapshotLoader};

use crate::{error::ApiError, ready};

/// `GET /departments`: the department forest.
pub async fn list<L: SnapshotLoader>(
  State(directory): State<Arc<Directory<L>>>,
) -> Result<Json<Vec<Department>>, ApiError> {
  let snapshot = ready(&directory)?;
  Ok(Json(snapshot.departments.clone()))
}

/// `GET /departments/{id}/users`: direct members, in catalog order.
pub async fn members<L: SnapshotLoader>(
  State(directory): State<Arc<Directory<L>>>,
  Path(id): Path<String>,
) -> Result<Json<Vec<User>>, ApiError> {
  let snapshot = ready(&directory)?;
  let department = snapshot
    .find_department(&id)
    .ok_or_else(|| ApiError::NotFound(format!("department {id}")))?;
  let users = search::members(department, &snapshot.users)
    .into_iter()
    .cloned()
    .collect();
  Ok(Json(users))
}
