//! File logging. The terminal belongs to the UI, so events go to a log file
//! through a non-blocking writer.

use std::path::Path;

use anyhow::Context as _;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

/// Install the global subscriber. `RUST_LOG` refines `level`.
///
/// Keep the returned guard alive for the life of the process; dropping it
/// flushes and closes the file.
pub fn init(log_file: &Path, level: &str) -> anyhow::Result<WorkerGuard> {
  let default = parse_level(level)?;
  let dir = log_file
    .parent()
    .filter(|p| !p.as_os_str().is_empty())
    .unwrap_or(Path::new("."));
  let name = log_file
    .file_name()
    .with_context(|| format!("log file {} has no file name", log_file.display()))?;
  std::fs::create_dir_all(dir)
    .with_context(|| format!("creating log directory {}", dir.display()))?;

  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));

  tracing_subscriber::fmt()
    .with_writer(writer)
    .with_ansi(false)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy(),
    )
    .init();

  tracing::info!(file = %log_file.display(), %default, "logging initialised");
  Ok(guard)
}

fn parse_level(level: &str) -> anyhow::Result<LevelFilter> {
  level
    .trim()
    .parse()
    .with_context(|| format!("invalid log level {level:?}"))
}
