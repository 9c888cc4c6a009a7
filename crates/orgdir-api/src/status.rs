//! Handlers for `GET /status` and `POST /refresh`.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use orgdir_directory::{Directory, LoadState, Origin, SnapshotLoader};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
  Loading,
  Ready,
  Failed,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct OriginBody {
  pub departments: Origin,
  pub users:       Origin,
}

/// Body of `GET /status` and `POST /refresh`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusBody {
  pub state:       Phase,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error:       Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub origin:      Option<OriginBody>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub departments: Option<usize>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub users:       Option<usize>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub loaded_at:   Option<DateTime<Utc>>,
}

impl From<&LoadState> for StatusBody {
  fn from(state: &LoadState) -> Self {
    let mut body = StatusBody {
      state:       Phase::Loading,
      error:       None,
      origin:      None,
      departments: None,
      users:       None,
      loaded_at:   None,
    };
    match state {
      LoadState::Loading => {}
      LoadState::Failed(e) => {
        body.state = Phase::Failed;
        body.error = Some(e.to_string());
      }
      LoadState::Ready(snapshot) => {
        body.state = Phase::Ready;
        body.origin = Some(OriginBody {
          departments: snapshot.departments_from,
          users:       snapshot.users_from,
        });
        body.departments = Some(snapshot.department_count());
        body.users = Some(snapshot.users.len());
        body.loaded_at = Some(snapshot.loaded_at);
      }
    }
    body
  }
}

/// `GET /status`
pub async fn get_status<L: SnapshotLoader>(
  State(directory): State<Arc<Directory<L>>>,
) -> Json<StatusBody> {
  Json(StatusBody::from(&directory.state()))
}

/// `POST /refresh`
///
/// Clears the cache and reloads from the CRM. Answers `502` with the status
/// body when the reload fails, and `202` when a newer load superseded this
/// one and is still running.
pub async fn refresh<L: SnapshotLoader + 'static>(
  State(directory): State<Arc<Directory<L>>>,
) -> (StatusCode, Json<StatusBody>) {
  info!("refresh requested");
  let state = directory.refresh().await;
  let code = match state {
    LoadState::Ready(_) => StatusCode::OK,
    LoadState::Loading => StatusCode::ACCEPTED,
    LoadState::Failed(_) => StatusCode::BAD_GATEWAY,
  };
  (code, Json(StatusBody::from(&state)))
}

#[cfg(test)]
mod tests {
  use axum::http::StatusCode;
  use serde_json::json;
  use tokio::sync::oneshot;

  use crate::testing::{directory, loaded, send};

  #[tokio::test]
  async fn status_before_first_load_is_loading() {
    let (status, body) = send(directory(), "GET", "/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "state": "loading" }));
  }

  #[tokio::test]
  async fn status_after_load_reports_counts_and_origin() {
    let (status, body) = send(loaded().await, "GET", "/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "ready");
    assert_eq!(body["departments"], 3);
    assert_eq!(body["users"], 3);
    assert_eq!(body["origin"], json!({ "departments": "network", "users": "cache" }));
    assert!(body.get("error").is_none());
  }

  #[tokio::test]
  async fn refresh_reloads_through_the_loader() {
    let dir = loaded().await;
    let (status, body) = send(dir.clone(), "POST", "/refresh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "ready");
    assert_eq!(*dir.loader().refreshes.lock().unwrap(), 1);
  }

  #[tokio::test]
  async fn failed_refresh_is_bad_gateway_and_sticks() {
    let dir = loaded().await;
    *dir.loader().fail_next.lock().unwrap() = true;

    let (status, body) = send(dir.clone(), "POST", "/refresh").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["state"], "failed");
    assert!(body["error"].as_str().unwrap().contains("connection reset"));

    let (status, body) = send(dir, "GET", "/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "failed");
  }

  #[tokio::test]
  async fn superseded_refresh_is_accepted() {
    let dir = loaded().await;
    let (first_tx, first_rx) = oneshot::channel();
    *dir.loader().gate.lock().unwrap() = Some(first_rx);
    let first = tokio::spawn(send(dir.clone(), "POST", "/refresh"));
    while *dir.loader().refreshes.lock().unwrap() < 1 {
      tokio::task::yield_now().await;
    }

    let (second_tx, second_rx) = oneshot::channel();
    *dir.loader().gate.lock().unwrap() = Some(second_rx);
    let second = tokio::spawn({
      let dir = dir.clone();
      async move { dir.refresh().await }
    });
    while *dir.loader().refreshes.lock().unwrap() < 2 {
      tokio::task::yield_now().await;
    }

    first_tx.send(()).unwrap();
    let (status, body) = first.await.unwrap();
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["state"], "loading");

    second_tx.send(()).unwrap();
    assert!(second.await.unwrap().snapshot().is_some());
    let (_, body) = send(dir, "GET", "/status").await;
    assert_eq!(body["state"], "ready");
  }
}
