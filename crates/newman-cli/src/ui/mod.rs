//! TUI rendering: header, screen body, status bar and popups.

pub mod composer;
pub mod dialog;
pub mod format;
pub mod login;
pub mod message_detail;
pub mod messages;

use newman_console::guard::{Gate, Route};
use newman_core::backend::Backend;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph},
};

use crate::app::{App, ComposerFocus};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw<B: Backend>(f: &mut Frame, app: &App<B>) {
  let area = f.area();

  // Vertical stack: header, body, status bar.
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);
  draw_body(f, rows[1], app);
  draw_status(f, rows[2], app);

  if let Some(dialog) = &app.dialog {
    dialog::draw(f, area, dialog.prompt());
  }
}

/// A `width` × `height` rectangle centred in `area`, clipped to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
  let width = width.min(area.width);
  let height = height.min(area.height);
  Rect {
    x: area.x + (area.width - width) / 2,
    y: area.y + (area.height - height) / 2,
    width,
    height,
  }
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header<B: Backend>(f: &mut Frame, area: Rect, app: &App<B>) {
  let auth = app.auth();

  let left = Span::styled(
    format!(" newman  {}", app.route.path()),
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right = if auth.is_signed_in() {
    Span::styled(
      format!("{} ", auth.display_name()),
      Style::default().fg(Color::Gray),
    )
  } else {
    Span::raw("")
  };

  // Simple left-right header: pad the middle.
  let pad = area
    .width
    .saturating_sub(left.width() as u16)
    .saturating_sub(right.width() as u16);

  let line = Line::from(vec![
    left,
    Span::raw(" ".repeat(pad as usize)),
    right,
  ]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Body ─────────────────────────────────────────────────────────────────────

fn draw_body<B: Backend>(f: &mut Frame, area: Rect, app: &App<B>) {
  match app.gate() {
    Gate::Loading | Gate::Redirect(_) | Gate::Render(Route::Root) => draw_loading(f, area),
    Gate::Render(Route::SignIn) => login::draw(f, area, &app.sign_in, "Sign in"),
    Gate::Render(Route::Register) => login::draw(f, area, &app.register, "Create account"),
    Gate::Render(Route::Messages) => match &app.list {
      Some(list) => match list.viewing() {
        Some(message) => message_detail::draw(f, area, message),
        None => messages::draw(f, area, list, app.list_cursor),
      },
      None => draw_loading(f, area),
    },
    Gate::Render(Route::CreateMessage) => match &app.composer {
      Some(_) => composer::draw(f, area, app),
      None => draw_loading(f, area),
    },
  }
}

fn draw_loading(f: &mut Frame, area: Rect) {
  let text = Paragraph::new("Loading…").style(Style::default().fg(Color::DarkGray));
  f.render_widget(text, centered(area, 10, 1));
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status<B: Backend>(f: &mut Frame, area: Rect, app: &App<B>) {
  let viewing = app.list.as_ref().is_some_and(|l| l.viewing().is_some());
  let (mode_label, hints) = match app.gate() {
    _ if app.dialog.is_some() => ("CONFIRM", "y/Enter yes  n/Esc no"),
    Gate::Loading | Gate::Redirect(_) | Gate::Render(Route::Root) => ("WAIT", "q quit"),
    Gate::Render(Route::SignIn) => (
      "SIGN IN",
      "Tab next field  Enter sign in  ^R create account  Esc quit",
    ),
    Gate::Render(Route::Register) => (
      "REGISTER",
      "Tab next field  Enter create  ^L sign in  Esc back",
    ),
    Gate::Render(Route::Messages) if viewing => ("DETAIL", "Esc back  d delete  q quit"),
    Gate::Render(Route::Messages) => (
      "MESSAGES",
      "↑↓/jk move  Enter view  ←→/hl page  1-9 go to  n new  d delete  r refresh  o sign out  q quit",
    ),
    Gate::Render(Route::CreateMessage) => match app.composer_focus {
      ComposerFocus::Targeting => (
        "COMPOSE",
        "1 manual  2 list  3 all  Space tick  Enter confirm  ^S send  Esc cancel",
      ),
      ComposerFocus::Chips => ("COMPOSE", "←→ move  x remove  Tab next  ^S send  Esc cancel"),
      _ => ("COMPOSE", "Tab next field  ^S send  Esc cancel"),
    },
  };

  let status = if app.status_msg.is_empty() {
    hints.to_string()
  } else {
    app.status_msg.clone()
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(
    format!("  {status}"),
    Style::default().fg(Color::DarkGray),
  );

  let line = Line::from(vec![mode_span, hint_span]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}
