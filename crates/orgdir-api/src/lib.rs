//! JSON REST API over a loaded org directory.
//!
//! Exposes an axum [`Router`] backed by a shared [`Directory`]. Transport,
//! TLS and request tracing are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", orgdir_api::api_router(directory.clone()))
//! ```

pub mod departments;
pub mod error;
pub mod search;
pub mod status;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use orgdir_directory::{Directory, LoadState, Snapshot, SnapshotLoader};

pub use error::ApiError;

/// Build the API router for `directory`.
pub fn api_router<L>(directory: Arc<Directory<L>>) -> Router<()>
where
  L: SnapshotLoader + 'static,
{
  Router::new()
    .route("/status", get(status::get_status::<L>))
    .route("/refresh", post(status::refresh::<L>))
    // Departments
    .route("/departments", get(departments::list::<L>))
    .route("/departments/{id}/users", get(departments::members::<L>))
    // Users
    .route("/users", get(users::list::<L>))
    .route("/users/{id}", get(users::get_one::<L>))
    // Search
    .route("/search", get(search::handler::<L>))
    .with_state(directory)
}

/// The snapshot to answer from, or the error that explains why there is none.
///
/// While a refresh runs, reads are served from the last successful snapshot.
pub(crate) fn ready<L: SnapshotLoader>(directory: &Directory<L>) -> Result<Arc<Snapshot>, ApiError> {
  match directory.state() {
    LoadState::Ready(snapshot) => Ok(snapshot),
    LoadState::Loading => directory.latest().ok_or(ApiError::NotReady),
    LoadState::Failed(e) => Err(ApiError::LoadFailed(e.to_string())),
  }
}
