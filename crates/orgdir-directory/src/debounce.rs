//! A cancellable delayed task.
//!
//! Each [`Debouncer::schedule`] aborts the previously scheduled task and
//! spawns a new one that sleeps for the quiet window and then runs its work.
//! The work is a plain closure, so once the window has passed it runs to
//! completion without another suspension point: an aborted task is always
//! stopped inside its sleep and never runs its work.

use std::time::Duration;

use tokio::task::JoinHandle;

/// Quiet window used by interactive search.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug)]
pub struct Debouncer {
  delay:   Duration,
  pending: Option<JoinHandle<()>>,
}

impl Default for Debouncer {
  fn default() -> Self { Self::new(DEFAULT_DELAY) }
}

impl Debouncer {
  pub fn new(delay: Duration) -> Self {
    Self {
      delay,
      pending: None,
    }
  }

  /// Run `work` after the quiet window unless another call supersedes it.
  ///
  /// # Panics
  ///
  /// Panics when called outside a Tokio runtime.
  pub fn schedule<F>(&mut self, work: F)
  where
    F: FnOnce() + Send + 'static,
  {
    self.cancel();
    let delay = self.delay;
    self.pending = Some(tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      work();
    }));
  }

  /// Abort the pending task. Returns whether one was still waiting.
  pub fn cancel(&mut self) -> bool {
    match self.pending.take() {
      Some(handle) if !handle.is_finished() => {
        handle.abort();
        true
      }
      _ => false,
    }
  }

  /// Whether a scheduled task has not finished yet.
  pub fn is_pending(&self) -> bool {
    self.pending.as_ref().is_some_and(|h| !h.is_finished())
  }
}

impl Drop for Debouncer {
  fn drop(&mut self) { self.cancel(); }
}
