//! Loading, refreshing and searching the organisation directory.
//!
//! - [`loader::DirectoryLoader`] drains the CRM catalogs through the
//!   `orgdir-core` ports, merges enrichment data and maintains the cache.
//! - [`directory::Directory`] owns the current [`Snapshot`] and publishes
//!   load state changes.
//! - [`session::SearchSession`] runs debounced searches over a snapshot.

pub mod debounce;
pub mod directory;
pub mod error;
pub mod loader;
pub mod session;
pub mod snapshot;

pub use directory::{Directory, LoadState};
pub use error::LoadError;
pub use loader::{DirectoryLoader, SnapshotLoader};
pub use session::{SearchSession, SearchState};
pub use snapshot::{Origin, Resource, Snapshot};
