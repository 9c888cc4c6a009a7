//! Query parsing and filtering of the department forest.
//!
//! A query runs in one of two modes:
//!
//! - **ID mode** when the trimmed query is only ASCII digits: a user matches
//!   when its identifier equals the query.
//! - **Text mode** otherwise. When a department's name contains the whole
//!   lower-cased query, every member of that department matches. Otherwise a
//!   member matches when its `"last first second"` name contains every
//!   whitespace-separated token of the query, in any order.
//!
//! The forest is visited depth-first, parents before children. A department
//! contributes a [`SearchHit`] only when it has matching members of its own;
//! its descendants are visited either way.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
  department::{Department, DepartmentSummary},
  hierarchy,
  user::User,
};

// ─── Query ───────────────────────────────────────────────────────────────────

/// A parsed, normalised search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
  /// Exact user identifier.
  Id(String),
  /// Free text, lower-cased.
  Text {
    /// The whole trimmed query, matched against department names.
    phrase: String,
    /// Non-empty whitespace-separated parts, matched against user names.
    tokens: Vec<String>,
  },
}

impl Query {
  /// Parse raw user input. Returns `None` for empty or whitespace-only input.
  pub fn parse(raw: &str) -> Option<Self> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
      return None;
    }
    if trimmed.chars().all(|c| c.is_ascii_digit()) {
      return Some(Self::Id(trimmed.to_owned()));
    }
    let phrase = trimmed.to_lowercase();
    let tokens = phrase.split_whitespace().map(str::to_owned).collect();
    Some(Self::Text { phrase, tokens })
  }

  fn matches_department(&self, dept: &Department) -> bool {
    match self {
      Self::Id(_) => false,
      Self::Text { phrase, .. } => dept.name.to_lowercase().contains(phrase.as_str()),
    }
  }

  fn matches_user(&self, user: &User, haystack: &str) -> bool {
    match self {
      Self::Id(id) => user.id() == id,
      Self::Text { tokens, .. } => tokens.iter().all(|t| haystack.contains(t.as_str())),
    }
  }
}

// ─── Result ──────────────────────────────────────────────────────────────────

/// One department of a search result with the members that matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
  pub department: DepartmentSummary,
  pub users:      Vec<User>,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Run `query` over the forest. Pure; builds a fresh result every call.
pub fn search(query: &Query, forest: &[Department], users: &[User]) -> Vec<SearchHit> {
  let index = MembershipIndex::new(users);

  hierarchy::walk(forest)
    .filter_map(|(_, dept)| {
      let members = index.members(dept);
      let matched: Vec<User> = if query.matches_department(dept) {
        members.map(|(user, _)| user.clone()).collect()
      } else {
        members
          .filter(|(user, haystack)| query.matches_user(user, haystack))
          .map(|(user, _)| user.clone())
          .collect()
      };
      (!matched.is_empty()).then(|| SearchHit {
        department: dept.summary(),
        users:      matched,
      })
    })
    .collect()
}

/// Parse and run a raw query; empty input yields an empty result.
pub fn search_raw(raw: &str, forest: &[Department], users: &[User]) -> Vec<SearchHit> {
  Query::parse(raw)
    .map(|q| search(&q, forest, users))
    .unwrap_or_default()
}

/// Direct members of `dept`, in user-list order.
pub fn members<'a>(dept: &Department, users: &'a [User]) -> Vec<&'a User> {
  match dept.numeric_id() {
    Some(id) => users.iter().filter(|u| u.profile.belongs_to(id)).collect(),
    None => Vec::new(),
  }
}

/// Department → member lookup built once per search, so each node costs a
/// hash lookup instead of a scan over every user.
struct MembershipIndex<'a> {
  users:      &'a [User],
  haystacks:  Vec<String>,
  by_dept:    HashMap<u64, Vec<usize>>,
}

impl<'a> MembershipIndex<'a> {
  fn new(users: &'a [User]) -> Self {
    let mut by_dept: HashMap<u64, Vec<usize>> = HashMap::new();
    for (i, user) in users.iter().enumerate() {
      let depts = &user.profile.departments;
      for (n, dept) in depts.iter().enumerate() {
        if !depts[..n].contains(dept) {
          by_dept.entry(*dept).or_default().push(i);
        }
      }
    }
    Self {
      users,
      haystacks: users.iter().map(|u| u.profile.search_haystack()).collect(),
      by_dept,
    }
  }

  fn members(&self, dept: &Department) -> impl Iterator<Item = (&'a User, &str)> + '_ {
    dept
      .numeric_id()
      .and_then(|id| self.by_dept.get(&id))
      .into_iter()
      .flatten()
      .map(|&i| (&self.users[i], self.haystacks[i].as_str()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{hierarchy, user::UserProfile};

  fn person(id: &str, last: &str, first: &str, second: &str, depts: &[u64]) -> User {
    User::from(UserProfile {
      first_name: Some(first.into()),
      last_name: Some(last.into()),
      second_name: Some(second.into()),
      departments: depts.to_vec(),
      ..UserProfile::new(id)
    })
  }

  fn forest() -> Vec<Department> {
    hierarchy::build(vec![
      Department::new("1", "Компания"),
      Department::new("2", "Бухгалтерия").with_parent("1"),
      Department::new("3", "ИТ отдел").with_parent("1"),
      Department::new("4", "Поддержка").with_parent("3"),
    ])
    .roots
  }

  fn staff() -> Vec<User> {
    vec![
      person("100", "Сидорова", "Анна", "Павловна", &[2]),
      person("117", "Петров", "Иван", "Сергеевич", &[4]),
      person("118", "Петров", "Олег", "Иванович", &[3]),
      person("119", "Иванов", "Пётр", "", &[2, 4]),
    ]
  }

  fn hit_ids(hits: &[SearchHit]) -> Vec<(&str, Vec<&str>)> {
    hits
      .iter()
      .map(|h| (h.department.id.as_str(), h.users.iter().map(User::id).collect()))
      .collect()
  }

  #[test]
  fn parse_classifies_queries() {
    assert_eq!(Query::parse("   "), None);
    assert_eq!(Query::parse(""), None);
    assert_eq!(Query::parse(" 117 "), Some(Query::Id("117".into())));
    assert_eq!(
      Query::parse("  Иван   ПЕТРОВ "),
      Some(Query::Text {
        phrase: "иван   петров".into(),
        tokens: vec!["иван".into(), "петров".into()],
      })
    );
    assert!(matches!(Query::parse("117a"), Some(Query::Text { .. })));
  }

  #[test]
  fn blank_query_yields_nothing() {
    assert!(search_raw(" \t ", &forest(), &staff()).is_empty());
  }

  #[test]
  fn numeric_query_matches_exact_id_only() {
    let hits = search_raw("117", &forest(), &staff());
    assert_eq!(hit_ids(&hits), vec![("4", vec!["117"])]);

    assert!(search_raw("11", &forest(), &staff()).is_empty());
  }

  #[test]
  fn tokens_match_in_any_order_and_all_are_required() {
    let hits = search_raw("иван петров", &forest(), &staff());
    // "Петров Олег Иванович" also contains both tokens.
    assert_eq!(hit_ids(&hits), vec![("3", vec!["118"]), ("4", vec!["117"])]);

    let hits = search_raw("иван сидорова", &forest(), &staff());
    assert!(hits.is_empty());
  }

  #[test]
  fn department_name_match_includes_all_members() {
    let hits = search_raw("бухгалтер", &forest(), &staff());
    assert_eq!(hit_ids(&hits), vec![("2", vec!["100", "119"])]);
  }

  #[test]
  fn empty_parent_is_omitted_but_descendants_still_hit() {
    // Department 3 ("ИТ отдел") has a member, but not a matching one.
    let hits = search_raw("пётр", &forest(), &staff());
    assert_eq!(hit_ids(&hits), vec![("2", vec!["119"]), ("4", vec!["119"])]);
    assert!(hits.iter().all(|h| h.department.id != "3"));
  }

  #[test]
  fn hits_follow_preorder() {
    let hits = search_raw("петров", &forest(), &staff());
    assert_eq!(hit_ids(&hits), vec![("3", vec!["118"]), ("4", vec!["117"])]);
  }

  #[test]
  fn members_uses_numeric_membership() {
    let users = staff();
    let forest = forest();
    let dept = hierarchy::find(&forest, "2").unwrap();
    let ids: Vec<_> = members(dept, &users).into_iter().map(User::id).collect();
    assert_eq!(ids, vec!["100", "119"]);
  }

  #[test]
  fn repeated_membership_is_counted_once() {
    let users = vec![person("5", "Дубль", "Иван", "", &[2, 2])];
    let hits = search_raw("дубль", &forest(), &users);
    assert_eq!(hit_ids(&hits), vec![("2", vec!["5"])]);
  }
}
