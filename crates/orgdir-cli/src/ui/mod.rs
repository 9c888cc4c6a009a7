//! TUI rendering: header, list pane, detail card and status bar.

pub mod directory_list;
pub mod user_card;

use chrono::Local;
use orgdir_directory::{LoadState, SnapshotLoader};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph},
};

use crate::app::App;

// ─── Root draw ───────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw<L: SnapshotLoader + 'static>(f: &mut Frame, app: &App<L>) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0]);

  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
    .split(rows[1]);
  directory_list::draw(f, cols[0], app);
  user_card::draw(f, cols[1], app);

  draw_status(f, rows[2], app);
}

// ─── Header ──────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect) {
  let date = Local::now().format("%Y-%m-%d").to_string();

  let left = Span::styled(
    " orgdir  [/] search  [r] refresh  [q] quit",
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(format!("{date} "), Style::default().fg(Color::DarkGray));

  let pad = area
    .width
    .saturating_sub(left.width() as u16)
    .saturating_sub(right.width() as u16);
  let line = Line::from(vec![left, Span::raw(" ".repeat(pad as usize)), right]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Status bar ──────────────────────────────────────────────────────────────

fn draw_status<L: SnapshotLoader + 'static>(f: &mut Frame, area: Rect, app: &App<L>) {
  let (mode_label, hints) = if app.input_active {
    ("SEARCH", "Type to search  Enter/↓ results  Esc clear")
  } else if app.in_search() {
    ("RESULTS", "↑↓/jk navigate  Enter expand  / edit  Esc clear  q quit")
  } else {
    ("TREE", "↑↓/jk navigate  Enter expand  / search  r refresh  q quit")
  };

  let (status, status_color) = match &app.load_state {
    LoadState::Loading => ("Loading directory…".to_string(), Color::Yellow),
    LoadState::Failed(e) => (format!("Error: {e}"), Color::Red),
    LoadState::Ready(snapshot) => (
      format!(
        "{}  ·  departments from {}, users from {}",
        hints, snapshot.departments_from, snapshot.users_from
      ),
      Color::DarkGray,
    ),
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let status_span = Span::styled(format!("  {status}"), Style::default().fg(status_color));

  f.render_widget(
    Paragraph::new(Line::from(vec![mode_span, status_span]))
      .style(Style::default().bg(Color::Black)),
    area,
  );
}
