//! Debounced interactive search over a snapshot.
//!
//! Every [`SearchSession::input`] call publishes [`SearchState::Searching`]
//! right away and schedules the search on a [`Debouncer`]; only the last
//! input inside the quiet window is searched. Blank input cancels the pending
//! search and publishes [`SearchState::Idle`] synchronously.

use std::{
  sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
  },
  time::{Duration, Instant},
};

use orgdir_core::search::{self, Query, SearchHit};
use tokio::sync::watch;
use tracing::debug;

use crate::{debounce::Debouncer, snapshot::Snapshot};

/// What the search box is showing.
#[derive(Debug, Clone, Default)]
pub enum SearchState {
  /// No query; the unfiltered directory is shown.
  #[default]
  Idle,
  /// A query is waiting out the quiet window.
  Searching { query: String },
  Done {
    query: String,
    hits:  Arc<Vec<SearchHit>>,
  },
}

impl SearchState {
  pub fn is_searching(&self) -> bool { matches!(self, Self::Searching { .. }) }

  pub fn is_idle(&self) -> bool { matches!(self, Self::Idle) }

  pub fn hits(&self) -> Option<&[SearchHit]> {
    match self {
      Self::Done { hits, .. } => Some(hits.as_slice()),
      _ => None,
    }
  }
}

#[derive(Debug)]
pub struct SearchSession {
  snapshot:   Arc<Snapshot>,
  query:      String,
  debouncer:  Debouncer,
  state:      Arc<watch::Sender<SearchState>>,
  generation: Arc<AtomicU64>,
}

impl SearchSession {
  pub fn new(snapshot: Arc<Snapshot>, delay: Duration) -> Self {
    let (state, _) = watch::channel(SearchState::Idle);
    Self {
      snapshot,
      query: String::new(),
      debouncer: Debouncer::new(delay),
      state: Arc::new(state),
      generation: Arc::new(AtomicU64::new(0)),
    }
  }

  pub fn subscribe(&self) -> watch::Receiver<SearchState> { self.state.subscribe() }

  pub fn state(&self) -> SearchState { self.state.borrow().clone() }

  pub fn is_searching(&self) -> bool { self.state.borrow().is_searching() }

  pub fn snapshot(&self) -> &Arc<Snapshot> { &self.snapshot }

  /// Record a change of the search box.
  pub fn input(&mut self, raw: impl Into<String>) {
    self.query = raw.into();
    self.schedule();
  }

  /// Empty the search box and return to the unfiltered view immediately.
  pub fn clear(&mut self) { self.input(String::new()); }

  /// Swap in a freshly loaded snapshot; an active query is searched again.
  pub fn replace_snapshot(&mut self, snapshot: Arc<Snapshot>) {
    self.snapshot = snapshot;
    if !self.state.borrow().is_idle() {
      self.schedule();
    }
  }

  fn schedule(&mut self) {
    let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

    let Some(query) = Query::parse(&self.query) else {
      self.debouncer.cancel();
      self.state.send_replace(SearchState::Idle);
      return;
    };

    let raw = self.query.clone();
    self.state.send_replace(SearchState::Searching { query: raw.clone() });

    let snapshot = self.snapshot.clone();
    let state = self.state.clone();
    let current = self.generation.clone();
    self.debouncer.schedule(move || {
      let started = Instant::now();
      let hits = search::search(&query, &snapshot.departments, &snapshot.users);
      debug!(
        query = %raw,
        hits = hits.len(),
        elapsed = ?started.elapsed(),
        "search finished"
      );
      state.send_if_modified(|s| {
        if current.load(Ordering::SeqCst) != generation {
          return false;
        }
        *s = SearchState::Done {
          query: raw,
          hits:  Arc::new(hits),
        };
        true
      });
    });
  }
}
