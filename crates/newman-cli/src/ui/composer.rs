//! Message composer: subject, body, targeting and the selected-store chips.

use newman_core::{
  backend::Backend,
  targeting::{TargetKind, Targeting},
};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::app::{App, ComposerFocus};

const KINDS: [(char, TargetKind); 3] = [
  ('1', TargetKind::Manual),
  ('2', TargetKind::List),
  ('3', TargetKind::All),
];

fn section(title: String, focused: bool) -> Block<'static> {
  let border = if focused { Color::Yellow } else { Color::DarkGray };
  Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border))
}

pub fn draw<B: Backend>(f: &mut Frame, area: Rect, app: &App<B>) {
  let Some(composer) = &app.composer else {
    return;
  };
  let focus = app.composer_focus;
  let list_open = composer.targeting().is_list_open();

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(3),                              // subject
      Constraint::Min(5),                                 // body
      Constraint::Length(if list_open { 14 } else { 6 }), // targeting
      Constraint::Length(3),                              // chips
    ])
    .split(area);

  // Subject
  let mut subject = composer.subject.clone();
  if focus == ComposerFocus::Subject {
    subject.push('_');
  }
  f.render_widget(
    Paragraph::new(subject).block(section(" Subject ".into(), focus == ComposerFocus::Subject)),
    rows[0],
  );

  // Body
  let mut body = composer.body.clone();
  if focus == ComposerFocus::Body {
    body.push('_');
  }
  f.render_widget(
    Paragraph::new(body)
      .wrap(Wrap { trim: false })
      .block(section(" Message Body ".into(), focus == ComposerFocus::Body)),
    rows[1],
  );

  draw_targeting(f, rows[2], app);
  draw_chips(f, rows[3], app);
}

fn draw_targeting<B: Backend>(f: &mut Frame, area: Rect, app: &App<B>) {
  let Some(composer) = &app.composer else {
    return;
  };
  let targeting = composer.targeting();
  let current = targeting.kind();

  let block = section(" Store Targeting ".into(), app.composer_focus == ComposerFocus::Targeting);
  let inner = block.inner(area);
  f.render_widget(block, area);

  let mut lines = Vec::new();
  let mut options = Vec::new();
  for (key, kind) in KINDS {
    let style = if current == Some(kind) {
      Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(Color::Gray)
    };
    options.push(Span::styled(format!(" [{key}] {} ", kind.label()), style));
    options.push(Span::raw(" "));
  }
  lines.push(Line::from(options));
  if let Some(kind) = current {
    lines.push(Line::from(Span::styled(
      kind.hint(),
      Style::default().fg(Color::DarkGray),
    )));
  }

  match targeting {
    Targeting::Manual {
      input,
      editing: true,
      ..
    } => {
      lines.push(Line::from(format!("Store codes (comma separated): {input}_")));
    }
    Targeting::All { selected } => {
      lines.push(Line::from(format!("All {} stores selected", selected.len())));
    }
    _ => {}
  }

  let used = lines.len() as u16;
  f.render_widget(Paragraph::new(lines), inner);

  if targeting.is_list_open() && inner.height > used + 1 {
    let checklist = Rect {
      y: inner.y + used,
      height: inner.height - used,
      ..inner
    };
    draw_checklist(f, checklist, app);
  }
}

fn draw_checklist<B: Backend>(f: &mut Frame, area: Rect, app: &App<B>) {
  let Some(composer) = &app.composer else {
    return;
  };
  let stores = app.filtered_stores();

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(1), Constraint::Min(0)])
    .split(area);

  f.render_widget(
    Paragraph::new(format!("/{}_", app.store_filter)).style(Style::default().fg(Color::Yellow)),
    rows[0],
  );

  if composer.stores().is_empty() {
    f.render_widget(
      Paragraph::new("No stores available").style(Style::default().fg(Color::DarkGray)),
      rows[1],
    );
    return;
  }

  let items: Vec<ListItem> = stores
    .iter()
    .map(|store| {
      let mark = if composer.targeting().is_checked(&store.code) { "[x]" } else { "[ ]" };
      ListItem::new(format!("{mark} {} - {}", store.code, store.name))
    })
    .collect();

  let mut state = ListState::default();
  state.select((!stores.is_empty()).then_some(app.store_cursor));
  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    rows[1],
    &mut state,
  );
}

fn draw_chips<B: Backend>(f: &mut Frame, area: Rect, app: &App<B>) {
  let Some(composer) = &app.composer else {
    return;
  };
  let selected = composer.selected_stores();
  let focused = app.composer_focus == ComposerFocus::Chips;
  let block = section(format!(" Selected Stores ({}) ", selected.len()), focused);

  let line = if selected.is_empty() {
    Line::from(Span::styled(
      "No stores selected",
      Style::default().fg(Color::DarkGray),
    ))
  } else {
    let spans: Vec<Span> = selected
      .iter()
      .enumerate()
      .flat_map(|(i, code)| {
        let style = if focused && i == app.chip_cursor {
          Style::default()
            .fg(Color::White)
            .bg(Color::Red)
            .add_modifier(Modifier::BOLD)
        } else {
          Style::default().fg(Color::Black).bg(Color::Gray)
        };
        [Span::styled(format!(" {code} × "), style), Span::raw(" ")]
      })
      .collect();
    Line::from(spans)
  };

  f.render_widget(
    Paragraph::new(line).wrap(Wrap { trim: false }).block(block),
    area,
  );
}
