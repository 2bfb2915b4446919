//! Yes/no confirmation popup.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::centered;

pub fn draw(f: &mut Frame, area: Rect, prompt: &str) {
  let popup = centered(area, 50, 6);
  let block = Block::default()
    .title(" Confirm ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Yellow));

  let lines = vec![
    Line::from(prompt.to_owned()),
    Line::from(""),
    Line::from(vec![
      Span::styled("[y] ", Style::default().add_modifier(Modifier::BOLD)),
      Span::raw("Yes   "),
      Span::styled("[n] ", Style::default().add_modifier(Modifier::BOLD)),
      Span::raw("No"),
    ]),
  ];

  f.render_widget(Clear, popup);
  f.render_widget(
    Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
    popup,
  );
}
