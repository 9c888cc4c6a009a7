//! Department tree and search results, left panel.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::{app::App, rows::Row};

/// Render the list pane into `area`.
pub fn draw<L>(f: &mut Frame, area: Rect, app: &App<L>)
where
  L: orgdir_directory::SnapshotLoader + 'static,
{
  let rows = app.rows();

  let title = match &app.snapshot {
    _ if app.in_search() => " Search ".to_string(),
    Some(snapshot) => format!(
      " Departments ({}) · Users ({}) ",
      snapshot.department_count(),
      snapshot.users.len()
    ),
    None => " Departments ".to_string(),
  };

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let mut inner = block.inner(area);
  f.render_widget(block, area);

  // Search box on the first line while a query is being typed or shown.
  if (app.input_active || !app.query.is_empty()) && inner.height > 2 {
    let input_area = Rect { height: 1, ..inner };
    inner.y += 1;
    inner.height -= 1;

    let text = if app.input_active {
      format!("/{}_", app.query)
    } else {
      format!("/{}", app.query)
    };
    f.render_widget(
      Paragraph::new(text).style(Style::default().fg(Color::Yellow)),
      input_area,
    );
  }

  let selected = app.selected_user.as_deref();
  let items: Vec<ListItem> = rows.iter().map(|row| item(row, selected)).collect();

  let mut state = ListState::default();
  state.select(match rows.first() {
    Some(Row::Message(_)) | None => None,
    Some(_) => Some(app.cursor),
  });

  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    inner,
    &mut state,
  );
}

fn item<'a>(row: &Row<'a>, selected: Option<&str>) -> ListItem<'a> {
  let marker = |open: bool| if open { "▾ " } else { "▸ " };
  let line = match row {
    Row::Department {
      depth,
      dept,
      expanded,
    } => Line::from(vec![
      Span::raw("  ".repeat(*depth)),
      Span::styled(marker(*expanded), Style::default().fg(Color::DarkGray)),
      Span::styled(dept.name.as_str(), Style::default().add_modifier(Modifier::BOLD)),
    ]),
    Row::Hit {
      name,
      count,
      expanded,
      ..
    } => Line::from(vec![
      Span::styled(marker(*expanded), Style::default().fg(Color::DarkGray)),
      Span::styled(*name, Style::default().add_modifier(Modifier::BOLD)),
      Span::styled(format!(" ({count})"), Style::default().fg(Color::Cyan)),
    ]),
    Row::User { depth, user } => {
      let name_style = if selected == Some(user.id()) {
        Style::default().fg(Color::Yellow)
      } else {
        Style::default()
      };
      let mut spans = vec![
        Span::raw("  ".repeat(*depth)),
        Span::styled("• ", Style::default().fg(Color::DarkGray)),
        Span::styled(user.profile.display_name(), name_style),
      ];
      if let Some(position) = &user.profile.work_position {
        spans.push(Span::styled(
          format!("  {position}"),
          Style::default().fg(Color::DarkGray),
        ));
      }
      Line::from(spans)
    }
    Row::Message(text) => Line::from(Span::styled(*text, Style::default().fg(Color::DarkGray))),
  };
  ListItem::new(line)
}
