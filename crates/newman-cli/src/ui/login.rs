//! Sign-in and registration forms.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Wrap},
};

use super::centered;
use crate::forms::{AuthForm, Field};

const FORM_WIDTH: u16 = 56;

pub fn draw(f: &mut Frame, area: Rect, form: &AuthForm, title: &str) {
  let mut lines: Vec<Line> = Vec::new();

  if let Some(notice) = &form.notice {
    lines.push(Line::from(Span::styled(
      notice.clone(),
      Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));
  }

  for &field in form.fields() {
    let focused = form.focus() == field;
    let label_style = if focused {
      Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(Color::Gray)
    };
    lines.push(Line::from(Span::styled(field.label(), label_style)));

    let value = form.value(field);
    let mut shown = match field {
      Field::Password => "•".repeat(value.chars().count()),
      _ => value.to_owned(),
    };
    if focused {
      shown.push('_');
    }
    lines.push(Line::from(format!("  {shown}")));

    match form.error(field) {
      Some(error) => lines.push(Line::from(Span::styled(
        format!("  {error}"),
        Style::default().fg(Color::Red),
      ))),
      None => lines.push(Line::from("")),
    }
  }

  let height = lines.len() as u16 + 2;
  let block = Block::default()
    .title(format!(" {title} "))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  f.render_widget(
    Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
    centered(area, FORM_WIDTH, height),
  );
}
