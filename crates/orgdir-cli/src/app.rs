//! Application state machine and event dispatcher.

use std::{collections::HashSet, sync::Arc, time::Duration};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use orgdir_core::user::User;
use orgdir_directory::{
  Directory, LoadState, SearchSession, SearchState, Snapshot, SnapshotLoader,
};
use tokio::sync::watch;
use tracing::info;

use crate::rows::{self, Row};

/// What a row toggles when Enter is pressed on it.
enum Target {
  Department(String),
  Hit(String),
  User(String),
}

// ─── App ─────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App<L> {
  pub directory: Arc<Directory<L>>,
  load_rx:       watch::Receiver<LoadState>,

  /// Latest state published by the directory.
  pub load_state: LoadState,

  /// Last successfully loaded snapshot. Kept while a refresh runs or fails.
  pub snapshot: Option<Arc<Snapshot>>,

  session:          Option<SearchSession>,
  search_rx:        Option<watch::Receiver<SearchState>>,
  pub search_state: SearchState,
  search_delay:     Duration,

  /// Text of the search box.
  pub query: String,

  /// Whether keystrokes go to the search box.
  pub input_active: bool,

  /// Expanded departments in the tree.
  pub expanded: HashSet<String>,

  /// Expanded hits in the search results.
  pub expanded_hits: HashSet<String>,

  /// ID of the user whose detail card is open.
  pub selected_user: Option<String>,

  /// Cursor position within [`App::rows`].
  pub cursor: usize,
}

impl<L: SnapshotLoader + 'static> App<L> {
  pub fn new(directory: Arc<Directory<L>>, search_delay: Duration) -> Self {
    let mut load_rx = directory.subscribe();
    let load_state = load_rx.borrow_and_update().clone();
    let mut app = Self {
      directory,
      load_rx,
      load_state: LoadState::Loading,
      snapshot: None,
      session: None,
      search_rx: None,
      search_state: SearchState::Idle,
      search_delay,
      query: String::new(),
      input_active: false,
      expanded: HashSet::new(),
      expanded_hits: HashSet::new(),
      selected_user: None,
      cursor: 0,
    };
    app.apply_load_state(load_state);
    app
  }

  // ── Background updates ────────────────────────────────────────────────────

  /// Pick up load and search results published since the last call.
  /// Returns `true` when anything changed.
  pub fn sync(&mut self) -> bool {
    let mut changed = false;

    if self.load_rx.has_changed().unwrap_or(false) {
      let state = self.load_rx.borrow_and_update().clone();
      self.apply_load_state(state);
      changed = true;
    }

    if let Some(rx) = &mut self.search_rx
      && rx.has_changed().unwrap_or(false)
    {
      self.search_state = rx.borrow_and_update().clone();
      self.clamp_cursor();
      changed = true;
    }

    changed
  }

  fn apply_load_state(&mut self, state: LoadState) {
    if let LoadState::Ready(snapshot) = &state {
      self.snapshot = Some(snapshot.clone());
      match &mut self.session {
        Some(session) => session.replace_snapshot(snapshot.clone()),
        None => {
          let session = SearchSession::new(snapshot.clone(), self.search_delay);
          self.search_rx = Some(session.subscribe());
          self.session = Some(session);
        }
      }
      if let Some(id) = &self.selected_user
        && snapshot.find_user(id).is_none()
      {
        self.selected_user = None;
      }
      self.clamp_cursor();
    }
    self.load_state = state;
  }

  /// Start a refresh in the background. The result arrives through
  /// [`App::sync`].
  pub fn refresh(&self) {
    info!("refresh requested");
    let directory = self.directory.clone();
    tokio::spawn(async move {
      directory.refresh().await;
    });
  }

  // ── Rows ──────────────────────────────────────────────────────────────────

  /// Whether the list shows search results rather than the tree.
  pub fn in_search(&self) -> bool { !self.search_state.is_idle() }

  /// Rows of the list pane.
  pub fn rows(&self) -> Vec<Row<'_>> {
    if let Some(rows) = rows::hits(&self.search_state, &self.expanded_hits) {
      return rows;
    }
    match &self.snapshot {
      Some(snapshot) => rows::tree(&snapshot.departments, &snapshot.users, &self.expanded),
      None if self.load_state.error().is_some() => vec![Row::Message("Load failed")],
      None => vec![Row::Message("Loading…")],
    }
  }

  /// The user whose detail card is open, if it is still in the snapshot.
  pub fn selected_user(&self) -> Option<&User> {
    let id = self.selected_user.as_deref()?;
    self.snapshot.as_ref()?.find_user(id)
  }

  fn clamp_cursor(&mut self) {
    let len = self.rows().len();
    self.cursor = self.cursor.min(len.saturating_sub(1));
  }

  fn target(&self) -> Option<Target> {
    let rows = self.rows();
    let row = rows.get(self.cursor)?;
    let key = row.toggle_key()?.to_owned();
    Some(match row {
      Row::Department { .. } => Target::Department(key),
      Row::Hit { .. } => Target::Hit(key),
      Row::User { .. } => Target::User(key),
      Row::Message(_) => return None,
    })
  }

  fn toggle(&mut self) {
    match self.target() {
      Some(Target::Department(id)) => toggle(&mut self.expanded, id),
      Some(Target::Hit(id)) => toggle(&mut self.expanded_hits, id),
      Some(Target::User(id)) => {
        self.selected_user = match self.selected_user.take() {
          Some(open) if open == id => None,
          _ => Some(id),
        };
      }
      None => {}
    }
  }

  // ── Search box ────────────────────────────────────────────────────────────

  fn set_query(&mut self, query: String) {
    self.query = query;
    self.cursor = 0;
    self.expanded_hits.clear();
    if let Some(session) = &mut self.session {
      session.input(self.query.clone());
    }
    self.sync();
  }

  /// Empty the search box and go back to the tree.
  pub fn clear_search(&mut self) {
    self.input_active = false;
    self.set_query(String::new());
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub fn handle_key(&mut self, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return false;
    }
    if self.input_active {
      self.handle_input_key(key);
      return true;
    }
    self.handle_list_key(key)
  }

  fn handle_input_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => self.clear_search(),
      KeyCode::Enter | KeyCode::Down => self.input_active = false,
      KeyCode::Backspace => {
        let mut query = self.query.clone();
        query.pop();
        self.set_query(query);
      }
      KeyCode::Char(c) => {
        let mut query = self.query.clone();
        query.push(c);
        self.set_query(query);
      }
      _ => {}
    }
  }

  fn handle_list_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Char('q') => return false,

      KeyCode::Down | KeyCode::Char('j') => {
        if self.cursor + 1 < self.rows().len() {
          self.cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.cursor = self.cursor.saturating_sub(1);
      }
      KeyCode::Home | KeyCode::Char('g') => self.cursor = 0,

      KeyCode::Enter | KeyCode::Char(' ') => self.toggle(),

      KeyCode::Char('/') => self.input_active = true,
      KeyCode::Esc if self.in_search() || !self.query.is_empty() => self.clear_search(),
      KeyCode::Esc => self.selected_user = None,

      KeyCode::Char('r') => self.refresh(),

      _ => {}
    }
    true
  }
}

fn toggle(set: &mut HashSet<String>, id: String) {
  if !set.remove(&id) {
    set.insert(id);
  }
}

#[cfg(test)]
mod tests {
  use std::{future::Future, sync::Mutex};

  use chrono::Utc;
  use orgdir_core::{department::Department, hierarchy, user::UserProfile};
  use orgdir_directory::{LoadError, Origin, Resource};

  use super::*;

  struct Fixed {
    snapshot: Snapshot,
    fail:     Mutex<bool>,
  }

  impl SnapshotLoader for Fixed {
    fn load(&self) -> impl Future<Output = Result<Snapshot, LoadError>> + Send + '_ {
      let result = if *self.fail.lock().unwrap() {
        Err(LoadError::Page {
          resource: Resource::Departments,
          start:    0,
          source:   "timed out".into(),
        })
      } else {
        Ok(self.snapshot.clone())
      };
      std::future::ready(result)
    }

    fn refresh(&self) -> impl Future<Output = Result<Snapshot, LoadError>> + Send + '_ {
      self.load()
    }
  }

  fn snapshot() -> Snapshot {
    let user = |id: &str, last: &str, dept: u64| {
      let mut p = UserProfile::new(id);
      p.last_name = Some(last.into());
      p.departments = vec![dept];
      User::from(p)
    };
    Snapshot {
      departments:      hierarchy::build([
        Department::new("1", "Head office"),
        Department::new("2", "Sales").with_parent("1"),
      ])
      .roots,
      users:            vec![user("10", "Иванов", 1), user("20", "Петров", 2)],
      departments_from: Origin::Network,
      users_from:       Origin::Network,
      loaded_at:        Utc::now(),
    }
  }

  async fn app() -> App<Fixed> {
    let directory = Arc::new(Directory::new(Fixed {
      snapshot: snapshot(),
      fail:     Mutex::new(false),
    }));
    directory.load().await;
    App::new(directory, Duration::from_millis(300))
  }

  fn press(app: &mut App<Fixed>, code: KeyCode) -> bool {
    app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
  }

  fn type_str(app: &mut App<Fixed>, s: &str) {
    for c in s.chars() {
      press(app, KeyCode::Char(c));
    }
  }

  #[tokio::test]
  async fn enter_expands_and_collapses_departments() {
    let mut app = app().await;
    assert_eq!(app.rows().len(), 1);

    press(&mut app, KeyCode::Enter);
    // Head office: its member, then Sales.
    assert_eq!(app.rows().len(), 3);

    press(&mut app, KeyCode::Enter);
    assert_eq!(app.rows().len(), 1);
  }

  #[tokio::test]
  async fn enter_on_user_toggles_detail_card() {
    let mut app = app().await;
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Down);

    press(&mut app, KeyCode::Enter);
    assert_eq!(app.selected_user().map(User::id), Some("10"));

    press(&mut app, KeyCode::Enter);
    assert!(app.selected_user().is_none());
  }

  #[tokio::test(start_paused = true)]
  async fn typing_searches_after_the_quiet_window() {
    let mut app = app().await;
    press(&mut app, KeyCode::Char('/'));
    type_str(&mut app, "пет");

    assert!(app.search_state.is_searching());
    assert_eq!(app.rows(), vec![Row::Message("Searching…")]);

    tokio::time::sleep(Duration::from_millis(301)).await;
    tokio::task::yield_now().await;
    assert!(app.sync());

    let rows = app.rows();
    assert_eq!(rows.len(), 1);
    assert!(matches!(rows[0], Row::Hit { name: "Sales", count: 1, .. }));
  }

  #[tokio::test(start_paused = true)]
  async fn unmatched_query_shows_nothing_found() {
    let mut app = app().await;
    press(&mut app, KeyCode::Char('/'));
    type_str(&mut app, "zzz");

    tokio::time::sleep(Duration::from_millis(301)).await;
    tokio::task::yield_now().await;
    app.sync();
    assert_eq!(app.rows(), vec![Row::Message("Nothing found")]);
  }

  #[tokio::test(start_paused = true)]
  async fn esc_returns_to_tree_immediately() {
    let mut app = app().await;
    press(&mut app, KeyCode::Char('/'));
    type_str(&mut app, "иван");
    assert!(app.in_search());

    press(&mut app, KeyCode::Esc);
    assert!(!app.in_search());
    assert!(!app.input_active);
    assert!(app.query.is_empty());
    assert_eq!(app.rows().len(), 1);
  }

  #[tokio::test]
  async fn failed_refresh_keeps_last_snapshot() {
    let mut app = app().await;
    *app.directory.loader().fail.lock().unwrap() = true;

    app.directory.refresh().await;
    assert!(app.sync());
    assert!(app.load_state.error().is_some());
    assert!(app.snapshot.is_some());
    assert_eq!(app.rows().len(), 1);
  }

  #[tokio::test]
  async fn q_quits_outside_the_search_box() {
    let mut app = app().await;
    press(&mut app, KeyCode::Char('/'));
    assert!(press(&mut app, KeyCode::Char('q')));
    assert_eq!(app.query, "q");

    press(&mut app, KeyCode::Enter);
    assert!(!press(&mut app, KeyCode::Char('q')));
  }
}
