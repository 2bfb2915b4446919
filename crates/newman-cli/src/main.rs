//! `newman`: terminal operations console for store broadcast messages.
//!
//! # Usage
//!
//! ```
//! newman --url https://project.supabase.co --anon-key eyJ...
//! newman --local ~/.local/share/newman/console.db --seed-stores
//! newman --config ~/.config/newman/config.toml
//! ```

mod app;
mod config;
mod forms;
mod logging;
mod seed;
mod ui;


use std::{collections::VecDeque, io, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use config::{BackendChoice, Settings};
use crossterm::{
  event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use newman_console::{Scope, SessionManager};
use newman_core::backend::Backend;
use newman_local::LocalBackend;
use newman_supabase::SupabaseBackend;
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "newman", about = "Terminal console for store broadcast messages")]
pub struct Args {
  /// Path to a TOML config file (url, anon_key, local_path, log_file,
  /// log_level).
  #[arg(short, long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// Supabase project URL.
  #[arg(long, env = "NEWMAN_URL")]
  pub url: Option<String>,

  /// Supabase anon (public) API key.
  #[arg(long, env = "NEWMAN_ANON_KEY")]
  pub anon_key: Option<String>,

  /// Use a local SQLite database instead of Supabase.
  #[arg(long, value_name = "FILE")]
  pub local: Option<PathBuf>,

  /// Where to write the log (default: newman.log in the temp directory).
  #[arg(long, value_name = "FILE")]
  pub log_file: Option<PathBuf>,

  /// Default log level; `RUST_LOG` refines it.
  #[arg(long, value_name = "LEVEL")]
  pub log_level: Option<String>,

  /// Fill an empty local store list with demo stores.
  #[arg(long)]
  pub seed_stores: bool,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  let settings = Settings::load(&args)?;
  let backend = settings.backend()?;
  let _log_guard = logging::init(&settings.log_file, &settings.log_level)?;

  match backend {
    BackendChoice::Local(path) => {
      info!(path = %path.display(), "using local backend");
      if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
          .with_context(|| format!("creating database directory {}", dir.display()))?;
      }
      let backend = LocalBackend::open(&path)
        .await
        .with_context(|| format!("opening database {}", path.display()))?;
      if args.seed_stores {
        let added = backend
          .seed_stores(seed::demo_stores())
          .await
          .context("seeding demo stores")?;
        info!(added, "seeded stores");
      }
      run(backend).await
    }
    BackendChoice::Supabase(config) => {
      info!(url = %config.url, "using supabase backend");
      if args.seed_stores {
        warn!("--seed-stores only applies to a local database");
      }
      run(SupabaseBackend::new(config).context("creating HTTP client")?).await
    }
  }
}

/// Drive the console against `backend` until the operator quits.
async fn run<B: Backend>(backend: B) -> Result<()> {
  let session = Arc::new(SessionManager::new(Arc::new(backend)));
  session.initialize().await;
  let mut app = App::new(Arc::clone(&session));

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let mut terminal = Terminal::new(CrosstermBackend::new(stdout)).context("creating terminal")?;

  let run_result = run_event_loop(&mut terminal, &mut app).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  drop(app);
  session.shutdown().await;
  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop<B: Backend>(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App<B>,
) -> Result<()> {
  // Keys typed while a request was pending, replayed in order.
  let mut queued = VecDeque::new();

  loop {
    app.sync().await;
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    let key = match queued.pop_front() {
      Some(key) => Some(key),
      // Poll for an event, yielding control to tokio while waiting.
      None => tokio::task::block_in_place(|| {
        if event::poll(Duration::from_millis(50))? {
          Ok::<_, io::Error>(pressed_key(event::read()?))
        } else {
          Ok(None)
        }
      })?,
    };

    if let Some(key) = key
      && !dispatch(app, key, &mut queued).await?
    {
      break;
    }
  }

  Ok(())
}

/// Handle `key`. Esc pressed meanwhile abandons whatever request the handler
/// ends up waiting on; other keys are queued for later.
async fn dispatch<B: Backend>(
  app: &mut App<B>,
  key: KeyEvent,
  queued: &mut VecDeque<KeyEvent>,
) -> Result<bool> {
  let Some(scope) = app.cancel_handle() else {
    return app.handle_key(key).await;
  };

  let handled = app.handle_key(key);
  tokio::pin!(handled);
  loop {
    tokio::select! {
      cont = &mut handled => return cont,
      key = next_key() => {
        if let Some(key) = key? {
          hold_key(key, &scope, queued);
        }
      }
    }
  }
}

/// Esc cancels `scope`; anything else waits in `queued`.
fn hold_key(key: KeyEvent, scope: &Scope, queued: &mut VecDeque<KeyEvent>) {
  if key.code == KeyCode::Esc {
    scope.cancel();
  } else {
    queued.push_back(key);
  }
}

/// Wait briefly, then take a queued key press if there is one.
async fn next_key() -> Result<Option<KeyEvent>> {
  tokio::time::sleep(Duration::from_millis(50)).await;
  let key = tokio::task::block_in_place(|| {
    if event::poll(Duration::ZERO)? {
      Ok::<_, io::Error>(pressed_key(event::read()?))
    } else {
      Ok(None)
    }
  })?;
  Ok(key)
}

fn pressed_key(event: Event) -> Option<KeyEvent> {
  match event {
    Event::Key(key) if key.kind == KeyEventKind::Press => Some(key),
    _ => None,
  }
}
