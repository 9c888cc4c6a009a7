//! The loaded directory as one immutable value.

use chrono::{DateTime, Utc};
use orgdir_core::{cache, department::Department, hierarchy, user::User};
use serde::{Deserialize, Serialize};
use strum::Display;

/// The two catalogs that make up the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Resource {
  Departments,
  Users,
}

impl Resource {
  /// The cache key the resource is stored under.
  pub fn cache_key(self) -> &'static str {
    match self {
      Self::Departments => cache::DEPARTMENTS,
      Self::Users => cache::USERS,
    }
  }
}

/// Where a resource's data came from during a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Origin {
  Cache,
  Network,
}

/// A fully loaded directory: the department forest and the merged users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
  /// Root departments with their subtrees attached.
  pub departments:      Vec<Department>,
  pub users:            Vec<User>,
  pub departments_from: Origin,
  pub users_from:       Origin,
  pub loaded_at:        DateTime<Utc>,
}

impl Snapshot {
  /// An empty snapshot, as if both catalogs were empty.
  pub fn empty() -> Self {
    Self {
      departments:      Vec::new(),
      users:            Vec::new(),
      departments_from: Origin::Network,
      users_from:       Origin::Network,
      loaded_at:        Utc::now(),
    }
  }

  pub fn department_count(&self) -> usize { hierarchy::count(&self.departments) }

  pub fn find_department(&self, id: &str) -> Option<&Department> {
    hierarchy::find(&self.departments, id)
  }

  pub fn find_user(&self, id: &str) -> Option<&User> {
    self.users.iter().find(|u| u.id() == id)
  }
}
