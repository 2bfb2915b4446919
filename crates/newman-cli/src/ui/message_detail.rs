//! Read-only view of one message.

use newman_core::message::Message;
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Wrap},
};

use super::format::format_date;

pub const NO_STORES: &str = "No stores selected";

pub fn draw(f: &mut Frame, area: Rect, message: &Message) {
  let label = Style::default()
    .fg(Color::Cyan)
    .add_modifier(Modifier::BOLD);

  let mut lines = vec![
    Line::from(Span::styled("Title", label)),
    Line::from(message.title.clone()),
    Line::from(""),
    Line::from(Span::styled("Date Created", label)),
    Line::from(format_date(message.date_created)),
    Line::from(""),
    Line::from(Span::styled("Message Body", label)),
  ];
  lines.extend(message.body.lines().map(|l| Line::from(l.to_owned())));
  lines.push(Line::from(""));
  lines.push(Line::from(Span::styled("Selected Stores", label)));
  if message.list_of_stores.is_empty() {
    lines.push(Line::from(Span::styled(
      NO_STORES,
      Style::default().fg(Color::DarkGray),
    )));
  } else {
    lines.extend(
      message
        .list_of_stores
        .iter()
        .map(|code| Line::from(format!("  • {code}"))),
    );
  }

  let block = Block::default()
    .title(" Message Details ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  f.render_widget(
    Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
    area,
  );
}
