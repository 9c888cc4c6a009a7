//! HTTP adapters for the CRM catalog and the enrichment service.
//!
//! [`CrmClient`] hands out one [`CatalogSource`] per paginated resource and
//! an [`EnrichmentClient`]; each implements the matching port trait from
//! `orgdir_core::source`.

mod client;
mod error;

pub use client::{CatalogSource, CrmClient, CrmConfig, EnrichmentClient};
pub use error::{Error, Result};
