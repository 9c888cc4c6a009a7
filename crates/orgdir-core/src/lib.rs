//! Core types and pure logic for the organisation directory.
//!
//! No HTTP, database or runtime dependencies live here. The crate owns the
//! data model, the hierarchy builder, the enrichment merger, the search
//! engine and the port traits that the adapter crates implement.

pub mod cache;
pub mod department;
pub mod error;
pub mod hierarchy;
pub mod lenient;
pub mod merge;
pub mod search;
pub mod source;
pub mod user;

pub use error::{Error, Result};
