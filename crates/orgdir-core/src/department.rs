//! Department records and the assembled department tree.

use serde::{Deserialize, Serialize};

use crate::lenient;

/// One department as delivered by the CRM, and a node of the assembled tree.
///
/// `children` is empty until [`crate::hierarchy::build`] attaches
/// descendants; it is never absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
  #[serde(rename = "ID", deserialize_with = "lenient::id")]
  pub id:       String,
  #[serde(rename = "NAME", default)]
  pub name:     String,
  #[serde(rename = "SORT", default, deserialize_with = "lenient::integer")]
  pub sort:     i64,
  /// Identifier of the head of department, if any.
  #[serde(rename = "UF_HEAD", default, deserialize_with = "lenient::optional_id")]
  pub head:     Option<String>,
  #[serde(rename = "PARENT", default, deserialize_with = "lenient::optional_id")]
  pub parent:   Option<String>,
  #[serde(default)]
  pub children: Vec<Department>,
}

impl Department {
  /// A childless department; mostly useful for fixtures.
  pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      id:       id.into(),
      name:     name.into(),
      sort:     0,
      head:     None,
      parent:   None,
      children: Vec::new(),
    }
  }

  /// Builder-style setter for the parent reference.
  pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
    self.parent = Some(parent.into());
    self
  }

  /// The identifier as used in user membership lists.
  ///
  /// Membership lists are numeric while department identifiers are strings,
  /// so the identifier is read as its leading decimal digits (`"12"` and
  /// `"12a"` both give `12`). Identifiers without leading digits have no
  /// members.
  pub fn numeric_id(&self) -> Option<u64> {
    let trimmed = self.id.trim_start();
    let end = trimmed
      .find(|c: char| !c.is_ascii_digit())
      .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
  }

  /// This department without its subtree.
  pub fn summary(&self) -> DepartmentSummary { DepartmentSummary::from(self) }
}

/// A department detached from its subtree, as carried by search hits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentSummary {
  #[serde(rename = "ID")]
  pub id:     String,
  #[serde(rename = "NAME")]
  pub name:   String,
  #[serde(rename = "SORT")]
  pub sort:   i64,
  #[serde(rename = "UF_HEAD")]
  pub head:   Option<String>,
  #[serde(rename = "PARENT")]
  pub parent: Option<String>,
}

impl From<&Department> for DepartmentSummary {
  fn from(d: &Department) -> Self {
    Self {
      id:     d.id.clone(),
      name:   d.name.clone(),
      sort:   d.sort,
      head:   d.head.clone(),
      parent: d.parent.clone(),
    }
  }
}
