//! Assembly of the department forest from a flat record list.
//!
//! The CRM returns departments as a flat list in which every record names its
//! parent. [`build`] turns that list into a forest: a department becomes a
//! root when it has no parent or when its parent is not part of the list.
//!
//! Guarantees beyond the happy path:
//!
//! - Duplicate identifiers collapse into one node that keeps the position of
//!   the first occurrence and the fields of the last one. The collapsed
//!   identifiers are reported in [`Hierarchy::duplicate_ids`].
//! - A department that names itself as parent, or that sits on a parent
//!   cycle, is never dropped. On a cycle the member that came first in the
//!   input becomes a root.

use std::collections::HashMap;

use crate::department::Department;

/// The assembled forest plus diagnostics about the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hierarchy {
  /// Root departments in input order.
  pub roots:         Vec<Department>,
  /// Identifiers seen more than once, one entry per extra occurrence.
  pub duplicate_ids: Vec<String>,
}

/// Build the department forest. Any `children` already present on the input
/// records are discarded.
pub fn build(records: impl IntoIterator<Item = Department>) -> Hierarchy {
  let mut index: HashMap<String, usize> = HashMap::new();
  let mut slots: Vec<Department> = Vec::new();
  let mut duplicate_ids = Vec::new();

  for mut dept in records {
    dept.children.clear();
    match index.get(&dept.id) {
      Some(&slot) => {
        duplicate_ids.push(dept.id.clone());
        slots[slot] = dept;
      }
      None => {
        index.insert(dept.id.clone(), slots.len());
        slots.push(dept);
      }
    }
  }

  let mut parents: Vec<Option<usize>> = slots
    .iter()
    .enumerate()
    .map(|(i, dept)| {
      dept
        .parent
        .as_ref()
        .and_then(|p| index.get(p).copied())
        .filter(|&p| p != i)
    })
    .collect();
  break_cycles(&mut parents);

  let mut children: Vec<Vec<usize>> = vec![Vec::new(); slots.len()];
  let mut root_slots = Vec::new();
  for (i, parent) in parents.iter().enumerate() {
    match parent {
      Some(p) => children[*p].push(i),
      None => root_slots.push(i),
    }
  }

  let mut pending: Vec<Option<Department>> = slots.into_iter().map(Some).collect();
  let roots = root_slots
    .into_iter()
    .filter_map(|i| assemble(i, &children, &mut pending))
    .collect();

  Hierarchy {
    roots,
    duplicate_ids,
  }
}

/// Detach the earliest member of every parent cycle so that all parent
/// chains terminate.
fn break_cycles(parents: &mut [Option<usize>]) {
  #[derive(Clone, Copy, PartialEq)]
  enum Mark {
    Unvisited,
    OnPath,
    Done,
  }

  let mut marks = vec![Mark::Unvisited; parents.len()];
  for start in 0..parents.len() {
    let mut path = Vec::new();
    let mut cursor = Some(start);
    while let Some(node) = cursor {
      match marks[node] {
        Mark::Done => break,
        Mark::OnPath => {
          let from = path.iter().position(|&n| n == node).unwrap_or(0);
          if let Some(&earliest) = path[from..].iter().min() {
            parents[earliest] = None;
          }
          break;
        }
        Mark::Unvisited => {
          marks[node] = Mark::OnPath;
          path.push(node);
          cursor = parents[node];
        }
      }
    }
    for node in path {
      marks[node] = Mark::Done;
    }
  }
}

fn assemble(
  slot: usize,
  children: &[Vec<usize>],
  pending: &mut [Option<Department>],
) -> Option<Department> {
  let mut node = pending[slot].take()?;
  node.children = children[slot]
    .iter()
    .filter_map(|&child| assemble(child, children, pending))
    .collect();
  Some(node)
}

// ─── Traversal ───────────────────────────────────────────────────────────────

/// Depth-first, parent-before-children iteration over a forest, yielding each
/// department with its depth (roots are depth 0). Siblings keep their order.
pub fn walk(forest: &[Department]) -> Walk<'_> {
  Walk {
    stack: forest.iter().rev().map(|d| (0, d)).collect(),
  }
}

/// Iterator returned by [`walk`].
#[derive(Debug, Clone)]
pub struct Walk<'a> {
  stack: Vec<(usize, &'a Department)>,
}

impl<'a> Iterator for Walk<'a> {
  type Item = (usize, &'a Department);

  fn next(&mut self) -> Option<Self::Item> {
    let (depth, dept) = self.stack.pop()?;
    self
      .stack
      .extend(dept.children.iter().rev().map(|c| (depth + 1, c)));
    Some((depth, dept))
  }
}

/// Find a department anywhere in the forest.
pub fn find<'a>(forest: &'a [Department], id: &str) -> Option<&'a Department> {
  walk(forest).map(|(_, d)| d).find(|d| d.id == id)
}

/// Total number of departments in the forest.
pub fn count(forest: &[Department]) -> usize { walk(forest).count() }
