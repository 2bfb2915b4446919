//! Message list with page controls.

use newman_console::messages::MessageList;
use newman_core::backend::Backend;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Row, Table, TableState},
};

use super::format::{excerpt, format_date, short_id};

pub const EMPTY: &str = "No messages found. Create your first message!";

pub fn draw<B: Backend>(f: &mut Frame, area: Rect, list: &MessageList<B>, cursor: usize) {
  let pagination = list.pagination();
  let block = Block::default()
    .title(format!(
      " Messages (page {} of {}) ",
      pagination.current, pagination.total_pages
    ))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  if list.messages().is_empty() {
    f.render_widget(
      Paragraph::new(EMPTY).style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  }

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Min(0),
      Constraint::Length(if list.shows_pagination() { 1 } else { 0 }),
    ])
    .split(inner);

  let header = Row::new(["ID", "Date Created", "Title", "Body"]).style(
    Style::default()
      .fg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let body = list.messages().iter().map(|m| {
    Row::new([
      short_id(m.id),
      format_date(m.date_created),
      m.title.clone(),
      excerpt(&m.body),
    ])
  });
  let table = Table::new(
    body,
    [
      Constraint::Length(12),
      Constraint::Length(23),
      Constraint::Percentage(30),
      Constraint::Min(10),
    ],
  )
  .header(header)
  .row_highlight_style(
    Style::default()
      .bg(Color::Blue)
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );

  let mut state = TableState::default();
  state.select(Some(cursor));
  f.render_stateful_widget(table, rows[0], &mut state);

  if list.shows_pagination() {
    draw_pagination(f, rows[1], list);
  }
}

fn draw_pagination<B: Backend>(f: &mut Frame, area: Rect, list: &MessageList<B>) {
  let pagination = list.pagination();
  let enabled = Style::default().fg(Color::White);
  let disabled = Style::default().fg(Color::DarkGray);

  let mut spans = vec![Span::styled(
    "‹ Previous ",
    if pagination.has_previous() { enabled } else { disabled },
  )];
  for page in pagination.window() {
    let span = if page == pagination.current {
      Span::styled(
        format!(" {page} "),
        Style::default()
          .fg(Color::Black)
          .bg(Color::Red)
          .add_modifier(Modifier::BOLD),
      )
    } else {
      Span::styled(format!(" {page} "), enabled)
    };
    spans.push(span);
  }
  spans.push(Span::styled(
    " Next ›",
    if pagination.has_next() { enabled } else { disabled },
  ));

  f.render_widget(Paragraph::new(Line::from(spans)).centered(), area);
}
