//! The current snapshot and its load state.
//!
//! Every load or refresh takes a new generation number. When a load finishes
//! after a newer one has started, its result is dropped: a stale snapshot or
//! error never overwrites the state of a later request. In-flight fetches are
//! not cancelled.
//!
//! The loader runs in a task owned by the directory, so a load completes and
//! publishes its result even when the caller stops waiting for it.

use std::sync::{
  Arc,
  atomic::{AtomicU64, Ordering},
};

use tokio::sync::watch;
use tracing::{debug, error};

use crate::{error::LoadError, loader::SnapshotLoader, snapshot::Snapshot};

/// Load state as seen by the rest of the application.
#[derive(Debug, Clone)]
pub enum LoadState {
  /// A load is in progress (or none has completed yet).
  Loading,
  Ready(Arc<Snapshot>),
  /// The latest load failed. Terminal until the next load or refresh.
  Failed(Arc<LoadError>),
}

impl LoadState {
  pub fn is_loading(&self) -> bool { matches!(self, Self::Loading) }

  pub fn snapshot(&self) -> Option<&Arc<Snapshot>> {
    match self {
      Self::Ready(snapshot) => Some(snapshot),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&LoadError> {
    match self {
      Self::Failed(e) => Some(&**e),
      _ => None,
    }
  }
}

#[derive(Clone, Copy)]
enum Mode {
  Load,
  Refresh,
}

/// Owns a [`SnapshotLoader`] and publishes [`LoadState`] changes.
#[derive(Debug)]
pub struct Directory<L> {
  loader:     L,
  state:      watch::Sender<LoadState>,
  /// The snapshot of the last successful load, kept across later loads.
  latest:     watch::Sender<Option<Arc<Snapshot>>>,
  generation: AtomicU64,
}

impl<L: SnapshotLoader> Directory<L> {
  pub fn new(loader: L) -> Self {
    let (state, _) = watch::channel(LoadState::Loading);
    let (latest, _) = watch::channel(None);
    Self {
      loader,
      state,
      latest,
      generation: AtomicU64::new(0),
    }
  }

  pub fn loader(&self) -> &L { &self.loader }

  /// A receiver notified on every state change.
  pub fn subscribe(&self) -> watch::Receiver<LoadState> { self.state.subscribe() }

  pub fn state(&self) -> LoadState { self.state.borrow().clone() }

  /// The current snapshot, if the last load succeeded.
  pub fn snapshot(&self) -> Option<Arc<Snapshot>> { self.state.borrow().snapshot().cloned() }

  /// The most recent successful snapshot, whatever the current state.
  pub fn latest(&self) -> Option<Arc<Snapshot>> { self.latest.borrow().clone() }

  fn begin(&self) -> u64 {
    let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
    self.state.send_replace(LoadState::Loading);
    generation
  }

  fn finish(&self, generation: u64, result: Result<Snapshot, LoadError>) -> LoadState {
    let current = self.generation.load(Ordering::SeqCst);
    if current != generation {
      debug!(generation, current, "discarding result of superseded load");
      return self.state();
    }

    let next = match result {
      Ok(snapshot) => {
        let snapshot = Arc::new(snapshot);
        self.latest.send_replace(Some(snapshot.clone()));
        LoadState::Ready(snapshot)
      }
      Err(e) => {
        error!(error = %e, "directory load failed");
        LoadState::Failed(Arc::new(e))
      }
    };
    self.state.send_replace(next.clone());
    next
  }
}

impl<L: SnapshotLoader + 'static> Directory<L> {
  /// Load, using the cache where possible.
  pub async fn load(self: &Arc<Self>) -> LoadState { self.run(Mode::Load).await }

  /// Invalidate the cache and load from the sources.
  pub async fn refresh(self: &Arc<Self>) -> LoadState { self.run(Mode::Refresh).await }

  async fn run(self: &Arc<Self>, mode: Mode) -> LoadState {
    let generation = self.begin();
    let directory = Arc::clone(self);
    let task = tokio::spawn(async move {
      let result = match mode {
        Mode::Load => directory.loader.load().await,
        Mode::Refresh => directory.loader.refresh().await,
      };
      directory.finish(generation, result)
    });

    match task.await {
      Ok(state) => state,
      Err(e) => self.finish(generation, Err(LoadError::Interrupted(e.to_string()))),
    }
  }
}
