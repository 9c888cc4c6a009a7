//! Joining CRM users with enrichment records.

use std::collections::HashMap;

use crate::user::{Enrichment, EnrichmentData, EnrichmentRecord, User};

/// Pair every user with the enrichment record that has the same identifier.
///
/// The output has the same length and order as `users`. A matched user
/// becomes [`Enrichment::Enriched`]; an unmatched one becomes
/// [`Enrichment::Base`], whatever enrichment it carried before. When the
/// enrichment set repeats an identifier, the first record wins.
///
/// The merge is pure, and merging an already-merged list with the same
/// records gives the same list.
pub fn merge(users: &[User], records: &[EnrichmentRecord]) -> Vec<User> {
  let mut by_id: HashMap<&str, &EnrichmentData> = HashMap::with_capacity(records.len());
  for record in records {
    by_id.entry(record.id.as_str()).or_insert(&record.data);
  }

  users
    .iter()
    .map(|user| User {
      profile:    user.profile.clone(),
      enrichment: match by_id.get(user.id()) {
        Some(data) => Enrichment::Enriched((*data).clone()),
        None => Enrichment::Base,
      },
    })
    .collect()
}

/// Number of users in `users` that carry enrichment data.
pub fn enriched_count(users: &[User]) -> usize {
  users.iter().filter(|u| u.has_api_data()).count()
}
