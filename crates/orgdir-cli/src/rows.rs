//! Flattening the directory into the rows of the list pane.
//!
//! Tree mode lists departments depth-first. An expanded department shows its
//! own members first, then its child departments. Search mode lists one row
//! per hit labelled `Department (n)`; an expanded hit shows its matching
//! users.

use std::collections::HashSet;

use orgdir_core::{department::Department, search, user::User};
use orgdir_directory::SearchState;

/// One line of the list pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row<'a> {
  Department {
    depth:    usize,
    dept:     &'a Department,
    expanded: bool,
  },
  /// A search hit: the department plus how many users matched in it.
  Hit {
    id:       &'a str,
    name:     &'a str,
    count:    usize,
    expanded: bool,
  },
  User { depth: usize, user: &'a User },
  /// Placeholder text such as `Nothing found`.
  Message(&'static str),
}

impl Row<'_> {
  /// Key used to toggle this row, if it is expandable.
  pub fn toggle_key(&self) -> Option<&str> {
    match self {
      Row::Department { dept, .. } => Some(&dept.id),
      Row::Hit { id, .. } => Some(*id),
      Row::User { user, .. } => Some(user.id()),
      Row::Message(_) => None,
    }
  }
}

/// Rows of the department tree. `expanded` holds department IDs.
pub fn tree<'a>(
  forest: &'a [Department],
  users: &'a [User],
  expanded: &HashSet<String>,
) -> Vec<Row<'a>> {
  let mut rows = Vec::new();
  for dept in forest {
    push_department(&mut rows, 0, dept, users, expanded);
  }
  rows
}

fn push_department<'a>(
  rows: &mut Vec<Row<'a>>,
  depth: usize,
  dept: &'a Department,
  users: &'a [User],
  expanded: &HashSet<String>,
) {
  let open = expanded.contains(&dept.id);
  rows.push(Row::Department {
    depth,
    dept,
    expanded: open,
  });
  if !open {
    return;
  }
  for user in search::members(dept, users) {
    rows.push(Row::User {
      depth: depth + 1,
      user,
    });
  }
  for child in &dept.children {
    push_department(rows, depth + 1, child, users, expanded);
  }
}

/// Rows for the current search state. `expanded` holds department IDs of
/// opened hits. Returns `None` when no search is active.
pub fn hits<'a>(state: &'a SearchState, expanded: &HashSet<String>) -> Option<Vec<Row<'a>>> {
  match state {
    SearchState::Idle => None,
    SearchState::Searching { .. } => Some(vec![Row::Message("Searching…")]),
    SearchState::Done { hits, .. } if hits.is_empty() => Some(vec![Row::Message("Nothing found")]),
    SearchState::Done { hits, .. } => {
      let mut rows = Vec::new();
      for hit in hits.iter() {
        let open = expanded.contains(&hit.department.id);
        rows.push(Row::Hit {
          id:       &hit.department.id,
          name:     &hit.department.name,
          count:    hit.users.len(),
          expanded: open,
        });
        if open {
          rows.extend(hit.users.iter().map(|user| Row::User { depth: 1, user }));
        }
      }
      Some(rows)
    }
  }
}
