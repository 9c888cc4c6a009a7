//! reqwest-backed page and enrichment sources.

use std::{future::Future, marker::PhantomData, time::Duration};

use orgdir_core::{
  department::Department,
  source::{EnrichmentSource, Page, PageSource},
  user::{EnrichmentRecord, UserProfile},
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{Error, Result};

/// Endpoints of the CRM catalog and the enrichment service.
#[derive(Debug, Clone)]
pub struct CrmConfig {
  pub departments_url: String,
  pub users_url:       String,
  pub enrichment_url:  String,
  pub timeout:         Duration,
}

impl CrmConfig {
  pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
}

/// Shared HTTP client for every CRM endpoint.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct CrmClient {
  client: Client,
  config: CrmConfig,
}

impl CrmClient {
  pub fn new(config: CrmConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(Error::Client)?;
    Ok(Self { client, config })
  }

  /// The paginated department catalog.
  pub fn departments(&self) -> CatalogSource<Department> {
    CatalogSource::new(self.client.clone(), &self.config.departments_url)
  }

  /// The paginated user catalog.
  pub fn users(&self) -> CatalogSource<UserProfile> {
    CatalogSource::new(self.client.clone(), &self.config.users_url)
  }

  pub fn enrichment(&self) -> EnrichmentClient {
    EnrichmentClient {
      client: self.client.clone(),
      url:    self.config.enrichment_url.clone(),
    }
  }
}

// ─── Catalog pages ───────────────────────────────────────────────────────────

/// `GET {url}?start=<start>&count=<count>` answering `{ "result": [...] }`.
pub struct CatalogSource<T> {
  client:  Client,
  url:     String,
  _record: PhantomData<fn() -> T>,
}

impl<T> CatalogSource<T> {
  fn new(client: Client, url: &str) -> Self {
    Self {
      client,
      url: url.to_owned(),
      _record: PhantomData,
    }
  }
}

impl<T> Clone for CatalogSource<T> {
  fn clone(&self) -> Self { Self::new(self.client.clone(), &self.url) }
}

impl<T> PageSource for CatalogSource<T>
where
  T: DeserializeOwned + Send + 'static,
{
  type Record = T;
  type Error = Error;

  fn fetch_page(
    &self,
    start: usize,
    count: usize,
  ) -> impl Future<Output = Result<Page<T>>> + Send + '_ {
    async move {
      let req = self
        .client
        .get(&self.url)
        .query(&[("start", start), ("count", count)]);
      let page: Page<T> = get_json(&self.url, req).await?;
      debug!(url = %self.url, start, count, received = page.result.len(), "fetched page");
      Ok(page)
    }
  }
}

// ─── Enrichment ──────────────────────────────────────────────────────────────

/// `GET {url}` answering a JSON array of enrichment records.
#[derive(Clone)]
pub struct EnrichmentClient {
  client: Client,
  url:    String,
}

impl EnrichmentSource for EnrichmentClient {
  type Error = Error;

  fn fetch_all(&self) -> impl Future<Output = Result<Vec<EnrichmentRecord>>> + Send + '_ {
    async move {
      let records: Vec<EnrichmentRecord> = get_json(&self.url, self.client.get(&self.url)).await?;
      debug!(url = %self.url, received = records.len(), "fetched enrichment records");
      Ok(records)
    }
  }
}

async fn get_json<T: DeserializeOwned>(url: &str, req: reqwest::RequestBuilder) -> Result<T> {
  let resp = req.send().await.map_err(|source| Error::Request {
    url: url.to_owned(),
    source,
  })?;

  let status = resp.status();
  if !status.is_success() {
    return Err(Error::Status {
      url: url.to_owned(),
      status,
    });
  }

  resp.json().await.map_err(|source| Error::Body {
    url: url.to_owned(),
    source,
  })
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use axum::{Json, Router, extract::Query, http::StatusCode, routing::get};
  use serde_json::{Value, json};

  use super::*;

  fn fixture_departments() -> Vec<Value> {
    (1..=7)
      .map(|i| json!({ "ID": i, "NAME": format!("Dept {i}"), "SORT": "500" }))
      .collect()
  }

  async fn departments(Query(q): Query<HashMap<String, usize>>) -> Json<Value> {
    let all = fixture_departments();
    let start = q.get("start").copied().unwrap_or(0).min(all.len());
    let end = (start + q.get("count").copied().unwrap_or(50)).min(all.len());
    Json(json!({ "result": all[start..end].to_vec() }))
  }

  async fn users() -> Json<Value> {
    Json(json!({
      "result": [
        { "ID": "10", "NAME": "Иван", "LAST_NAME": "Петров", "UF_DEPARTMENT": [1, "2"], "ACTIVE": true },
      ],
      "total": 1,
    }))
  }

  async fn enrichment() -> Json<Value> {
    Json(json!([
      { "id": 10, "computer_name": "WS-010", "log_on": "2024-03-01" },
      { "id": "11", "phone_number": null },
    ]))
  }

  /// Serve a fake CRM on an ephemeral port and return its base URL.
  async fn serve() -> String {
    let app = Router::new()
      .route("/departments", get(departments))
      .route("/users", get(users))
      .route("/enrichment", get(enrichment))
      .route("/broken", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
      .route("/garbage", get(|| async { "<html>not json</html>" }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
  }

  fn client(base: &str) -> CrmClient {
    CrmClient::new(CrmConfig {
      departments_url: format!("{base}/departments"),
      users_url:       format!("{base}/users"),
      enrichment_url:  format!("{base}/enrichment"),
      timeout:         Duration::from_secs(5),
    })
    .unwrap()
  }

  #[tokio::test]
  async fn department_pages_follow_start_and_count() {
    let base = serve().await;
    let source = client(&base).departments();

    let first = source.fetch_page(0, 3).await.unwrap();
    let ids: Vec<_> = first.result.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, ["1", "2", "3"]);
    assert_eq!(first.result[0].sort, 500);

    let last = source.fetch_page(6, 3).await.unwrap();
    assert_eq!(last.result.len(), 1);
    assert_eq!(last.result[0].name, "Dept 7");

    let past_end = source.fetch_page(9, 3).await.unwrap();
    assert!(past_end.result.is_empty());
  }

  #[tokio::test]
  async fn user_pages_ignore_unknown_fields() {
    let base = serve().await;
    let page = client(&base).users().fetch_page(0, 50).await.unwrap();

    assert_eq!(page.result.len(), 1);
    let user = &page.result[0];
    assert_eq!(user.id, "10");
    assert!(user.active);
    assert_eq!(user.departments, vec![1, 2]);
  }

  #[tokio::test]
  async fn enrichment_normalizes_ids() {
    let base = serve().await;
    let records = client(&base).enrichment().fetch_all().await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "10");
    assert_eq!(records[0].data.computer_name.as_deref(), Some("WS-010"));
    assert_eq!(records[1].id, "11");
    assert_eq!(records[1].data.phone_number, None);
  }

  #[tokio::test]
  async fn error_status_is_reported() {
    let base = serve().await;
    let mut crm = client(&base);
    crm.config.users_url = format!("{base}/broken");

    let err = crm.users().fetch_page(0, 50).await.unwrap_err();
    assert!(
      matches!(err, Error::Status { status, .. } if status == reqwest::StatusCode::INTERNAL_SERVER_ERROR)
    );
  }

  #[tokio::test]
  async fn malformed_body_is_reported() {
    let base = serve().await;
    let mut crm = client(&base);
    crm.config.enrichment_url = format!("{base}/garbage");

    let err = crm.enrichment().fetch_all().await.unwrap_err();
    assert!(matches!(err, Error::Body { .. }));
  }

  #[tokio::test]
  async fn unreachable_host_is_a_request_error() {
    let crm = client("http://127.0.0.1:9");
    let err = crm.departments().fetch_page(0, 50).await.unwrap_err();
    assert!(matches!(err, Error::Request { .. }));
  }
}
