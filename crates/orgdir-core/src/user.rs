//! Users, enrichment records and the merged user model.
//!
//! A [`User`] is the pairing of a CRM [`UserProfile`] with an [`Enrichment`]
//! state. Enrichment fields exist only on the [`Enrichment::Enriched`]
//! variant, so "enriched" and "has enrichment data" cannot disagree.

use serde::{Deserialize, Serialize};

use crate::lenient;

// ─── Profile ─────────────────────────────────────────────────────────────────

/// The base user record as delivered by the CRM user catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
  #[serde(rename = "ID", deserialize_with = "lenient::id")]
  pub id:                  String,
  #[serde(rename = "ACTIVE", default, deserialize_with = "lenient::flag")]
  pub active:              bool,
  #[serde(rename = "NAME", default)]
  pub first_name:          Option<String>,
  #[serde(rename = "LAST_NAME", default)]
  pub last_name:           Option<String>,
  #[serde(rename = "SECOND_NAME", default)]
  pub second_name:         Option<String>,
  #[serde(rename = "EMAIL", default)]
  pub email:               Option<String>,
  #[serde(rename = "IS_ONLINE", default, deserialize_with = "lenient::flag")]
  pub is_online:           bool,
  #[serde(rename = "LAST_LOGIN", default)]
  pub last_login:          Option<String>,
  #[serde(rename = "DATE_REGISTER", default)]
  pub date_register:       Option<String>,
  #[serde(rename = "PERSONAL_BIRTHDAY", default)]
  pub personal_birthday:   Option<String>,
  #[serde(rename = "PERSONAL_CITY", default)]
  pub personal_city:       Option<String>,
  #[serde(rename = "PERSONAL_MAILBOX", default)]
  pub personal_mailbox:    Option<String>,
  #[serde(rename = "PERSONAL_MOBILE", default)]
  pub personal_mobile:     Option<String>,
  #[serde(rename = "PERSONAL_PHONE", default)]
  pub personal_phone:      Option<String>,
  #[serde(rename = "PERSONAL_PROFESSION", default)]
  pub personal_profession: Option<String>,
  #[serde(rename = "PERSONAL_STREET", default)]
  pub personal_street:     Option<String>,
  #[serde(rename = "PERSONAL_PHOTO", default)]
  pub personal_photo:      Option<String>,
  #[serde(rename = "UF_EMPLOYMENT_DATE", default)]
  pub employment_date:     Option<String>,
  #[serde(rename = "WORK_POSITION", default)]
  pub work_position:       Option<String>,
  #[serde(rename = "WORK_PHONE", default)]
  pub work_phone:          Option<String>,
  /// Numeric identifiers of every department the user belongs to.
  #[serde(rename = "UF_DEPARTMENT", default, deserialize_with = "lenient::department_ids")]
  pub departments:         Vec<u64>,
}

impl UserProfile {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      ..Self::default()
    }
  }

  /// `LAST_NAME NAME SECOND_NAME`, skipping missing or blank parts.
  pub fn display_name(&self) -> String {
    [&self.last_name, &self.first_name, &self.second_name]
      .into_iter()
      .filter_map(|part| part.as_deref().map(str::trim))
      .filter(|part| !part.is_empty())
      .collect::<Vec<_>>()
      .join(" ")
  }

  /// The lower-cased text that name searches run against.
  pub fn search_haystack(&self) -> String {
    [&self.last_name, &self.first_name, &self.second_name]
      .into_iter()
      .map(|part| part.as_deref().unwrap_or_default())
      .collect::<Vec<_>>()
      .join(" ")
      .to_lowercase()
  }

  pub fn belongs_to(&self, department_id: u64) -> bool {
    self.departments.contains(&department_id)
  }
}

// ─── Enrichment ──────────────────────────────────────────────────────────────

/// Auxiliary account and device data from the enrichment service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentData {
  #[serde(default, deserialize_with = "lenient::text")]
  pub create_account:      Option<String>,
  #[serde(default, deserialize_with = "lenient::text")]
  pub account_name:        Option<String>,
  #[serde(default, deserialize_with = "lenient::text")]
  pub ip_base_station:     Option<String>,
  #[serde(default, deserialize_with = "lenient::text")]
  pub computer_name:       Option<String>,
  #[serde(default, deserialize_with = "lenient::text")]
  pub computer_domain_reg: Option<String>,
  #[serde(default, deserialize_with = "lenient::text")]
  pub log_on:              Option<String>,
  #[serde(default, deserialize_with = "lenient::text")]
  pub phone_number:        Option<String>,
}

/// One record of the enrichment service. The identifier may arrive as a
/// number; it is normalised to a string so it compares equal to
/// [`UserProfile::id`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentRecord {
  #[serde(alias = "ID", deserialize_with = "lenient::id")]
  pub id:   String,
  #[serde(flatten)]
  pub data: EnrichmentData,
}

/// Whether a user was matched by the enrichment service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Enrichment {
  #[default]
  Base,
  Enriched(EnrichmentData),
}

// ─── Merged user ─────────────────────────────────────────────────────────────

/// A directory user: CRM profile plus enrichment state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub profile:    UserProfile,
  #[serde(default)]
  pub enrichment: Enrichment,
}

impl User {
  pub fn id(&self) -> &str { &self.profile.id }

  pub fn has_api_data(&self) -> bool {
    matches!(self.enrichment, Enrichment::Enriched(_))
  }

  pub fn enrichment_data(&self) -> Option<&EnrichmentData> {
    match &self.enrichment {
      Enrichment::Enriched(data) => Some(data),
      Enrichment::Base => None,
    }
  }
}

impl From<UserProfile> for User {
  fn from(profile: UserProfile) -> Self {
    Self {
      profile,
      enrichment: Enrichment::Base,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ivan() -> UserProfile {
    UserProfile {
      first_name: Some("Иван".into()),
      last_name: Some("Петров".into()),
      second_name: Some("Сергеевич".into()),
      ..UserProfile::new("117")
    }
  }

  #[test]
  fn parses_crm_user() {
    let profile: UserProfile = serde_json::from_str(
      r#"{
        "ID": "117", "ACTIVE": true, "NAME": "Иван", "LAST_NAME": "Петров",
        "SECOND_NAME": "", "IS_ONLINE": "N", "UF_DEPARTMENT": [1, 5],
        "LAST_ACTIVITY_DATE": {}, "UF_USR_1728984148328": false
      }"#,
    )
    .unwrap();
    assert_eq!(profile.id, "117");
    assert!(profile.active);
    assert!(!profile.is_online);
    assert_eq!(profile.departments, vec![1, 5]);
    assert!(profile.belongs_to(5));
    assert!(!profile.belongs_to(2));
  }

  #[test]
  fn display_name_skips_blank_parts() {
    let mut p = ivan();
    assert_eq!(p.display_name(), "Петров Иван Сергеевич");
    p.second_name = Some(String::new());
    assert_eq!(p.display_name(), "Петров Иван");
  }

  #[test]
  fn haystack_is_lowercase_and_space_joined() {
    assert_eq!(ivan().search_haystack(), "петров иван сергеевич");
  }

  #[test]
  fn enrichment_record_accepts_numeric_id() {
    let record: EnrichmentRecord = serde_json::from_str(
      r#"{"id": 42, "computer_name": "WS-042", "log_on": "ivanov", "extra": 1}"#,
    )
    .unwrap();
    assert_eq!(record.id, "42");
    assert_eq!(record.data.computer_name.as_deref(), Some("WS-042"));
    assert_eq!(record.data.log_on.as_deref(), Some("ivanov"));
  }

  #[test]
  fn base_user_has_no_api_data() {
    let user = User::from(ivan());
    assert!(!user.has_api_data());
    assert!(user.enrichment_data().is_none());
    assert_eq!(user.id(), "117");
  }

  #[test]
  fn enriched_user_reads_back_from_json() {
    let user = User {
      profile:    ivan(),
      enrichment: Enrichment::Enriched(EnrichmentData {
        log_on: Some("petrov".into()),
        ..EnrichmentData::default()
      }),
    };
    let json = serde_json::to_string(&user).unwrap();
    let back: User = serde_json::from_str(&json).unwrap();
    assert_eq!(back, user);
    assert!(back.has_api_data());
  }
}
