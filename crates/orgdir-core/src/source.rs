//! Port traits for the remote catalogs the directory is loaded from.
//!
//! Implemented by `orgdir-crm` over HTTP and by in-memory fakes in tests.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::user::EnrichmentRecord;

/// One page of a paginated catalog response: `{ "result": [...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
  pub result: Vec<T>,
}

/// A catalog that serves records `count` at a time from offset `start`.
///
/// A page holding fewer than `count` records is the last one.
pub trait PageSource: Send + Sync {
  type Record: Send;
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch records `start..start + count`.
  fn fetch_page(
    &self,
    start: usize,
    count: usize,
  ) -> impl Future<Output = Result<Page<Self::Record>, Self::Error>> + Send + '_;
}

/// The enrichment service: one unpaginated request for every record.
pub trait EnrichmentSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn fetch_all(
    &self,
  ) -> impl Future<Output = Result<Vec<EnrichmentRecord>, Self::Error>> + Send + '_;
}
