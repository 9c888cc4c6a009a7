//! User detail card, right panel.

use orgdir_core::user::User;
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::App;

const NOT_SPECIFIED: &str = "not specified";

// ─── Public entry ────────────────────────────────────────────────────────────

/// Render the detail card of the selected user into `area`.
pub fn draw<L>(f: &mut Frame, area: Rect, app: &App<L>)
where
  L: orgdir_directory::SnapshotLoader + 'static,
{
  let Some(user) = app.selected_user() else {
    draw_empty(f, area);
    return;
  };

  let block = Block::default()
    .title(format!(" {} ", user.profile.display_name()))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let mut lines: Vec<Line> = Vec::new();
  if let Some(position) = &user.profile.work_position {
    lines.push(Line::from(Span::styled(
      position.clone(),
      Style::default().fg(Color::Yellow),
    )));
    lines.push(Line::from(""));
  }

  let base = fields(user);
  let split = BASE_FIELDS.min(base.len());
  for (i, (label, value)) in base.into_iter().enumerate() {
    if i == split {
      lines.push(Line::from(""));
    }
    let value_style = if value == NOT_SPECIFIED {
      Style::default().fg(Color::DarkGray)
    } else {
      Style::default()
    };
    lines.push(Line::from(vec![
      Span::styled(
        format!("{label:<22}"),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
      ),
      Span::styled(value, value_style),
    ]));
  }

  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn draw_empty(f: &mut Frame, area: Rect) {
  let block = Block::default()
    .title(" User ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(
    Paragraph::new("Select a user and press Enter.").style(Style::default().fg(Color::DarkGray)),
    inner,
  );
}

// ─── Field formatting ────────────────────────────────────────────────────────

/// Number of CRM fields at the head of [`fields`].
const BASE_FIELDS: usize = 14;

/// Label/value pairs shown on the card, CRM fields first, then the
/// enrichment fields for enriched users only.
pub fn fields(user: &User) -> Vec<(&'static str, String)> {
  let p = &user.profile;
  let mut out = vec![
    ("ID", p.id.clone()),
    ("Active", yes_no(p.active)),
    ("Registered", or_not_specified(&p.date_register)),
    ("Work e-mail", or_not_specified(&p.email)),
    ("Online", yes_no(p.is_online)),
    ("Last login", or_not_specified(&p.last_login)),
    ("Birthday", or_not_specified(&p.personal_birthday)),
    ("City", or_not_specified(&p.personal_city)),
    ("Personal e-mail", or_not_specified(&p.personal_mailbox)),
    ("Mobile", or_not_specified(&p.personal_mobile)),
    ("Phone", or_not_specified(&p.personal_phone)),
    ("Profession", or_not_specified(&p.personal_profession)),
    ("Address", or_not_specified(&p.personal_street)),
    ("Employed since", or_not_specified(&p.employment_date)),
  ];

  if let Some(data) = user.enrichment_data() {
    out.extend([
      ("Account created", or_not_specified(&data.create_account)),
      ("Account name", or_not_specified(&data.account_name)),
      ("Base station IP", or_not_specified(&data.ip_base_station)),
      ("Computer name", or_not_specified(&data.computer_name)),
      ("Computer domain", or_not_specified(&data.computer_domain_reg)),
      ("Logon", or_not_specified(&data.log_on)),
      ("Phone number", or_not_specified(&data.phone_number)),
    ]);
  }
  out
}

fn yes_no(flag: bool) -> String { if flag { "yes" } else { "no" }.to_string() }

fn or_not_specified(value: &Option<String>) -> String {
  match value.as_deref().map(str::trim) {
    Some(v) if !v.is_empty() => v.to_string(),
    _ => NOT_SPECIFIED.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use orgdir_core::{
    merge,
    user::{EnrichmentData, EnrichmentRecord, UserProfile},
  };

  use super::*;

  fn value<'a>(fields: &'a [(&'static str, String)], label: &str) -> Option<&'a str> {
    fields.iter().find(|(l, _)| *l == label).map(|(_, v)| v.as_str())
  }

  #[test]
  fn missing_values_read_not_specified() {
    let mut profile = UserProfile::new("7");
    profile.personal_city = Some("Казань".into());
    profile.email = Some("".into());
    profile.active = true;
    let fields = fields(&User::from(profile));

    assert_eq!(fields.len(), BASE_FIELDS);
    assert_eq!(value(&fields, "ID"), Some("7"));
    assert_eq!(value(&fields, "Active"), Some("yes"));
    assert_eq!(value(&fields, "Online"), Some("no"));
    assert_eq!(value(&fields, "City"), Some("Казань"));
    assert_eq!(value(&fields, "Work e-mail"), Some(NOT_SPECIFIED));
    assert_eq!(value(&fields, "Birthday"), Some(NOT_SPECIFIED));
  }

  #[test]
  fn enrichment_fields_only_for_enriched_users() {
    let base = [User::from(UserProfile::new("7")), User::from(UserProfile::new("8"))];
    let records = [EnrichmentRecord {
      id:   "7".into(),
      data: EnrichmentData {
        log_on: Some("ivanov".into()),
        ..Default::default()
      },
    }];
    let users = merge::merge(&base, &records);

    let enriched = fields(&users[0]);
    assert_eq!(enriched.len(), BASE_FIELDS + 7);
    assert_eq!(value(&enriched, "Logon"), Some("ivanov"));
    assert_eq!(value(&enriched, "Computer name"), Some(NOT_SPECIFIED));

    let plain = fields(&users[1]);
    assert_eq!(value(&plain, "Logon"), None);
  }
}
