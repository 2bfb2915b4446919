//! Layered settings: defaults, optional TOML file, `NEWMAN_*` environment,
//! then command-line flags.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, bail};
use newman_supabase::SupabaseConfig;
use serde::Deserialize;

use crate::Args;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
  #[serde(default)]
  pub url:        Option<String>,
  #[serde(default)]
  pub anon_key:   Option<String>,
  /// SQLite file for the local backend.
  #[serde(default)]
  pub local_path: Option<PathBuf>,
  pub log_file:   PathBuf,
  pub log_level:  String,
}

/// Which backend the console talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendChoice {
  Local(PathBuf),
  Supabase(SupabaseConfig),
}

impl Settings {
  pub fn load(args: &Args) -> anyhow::Result<Self> {
    let mut builder = config::Config::builder()
      .set_default("log_file", default_log_file().to_string_lossy().into_owned())?
      .set_default("log_level", "info")?;

    if let Some(path) = &args.config {
      builder = builder.add_source(config::File::from(path.as_path()).required(true));
    }

    let settings: Settings = builder
      .add_source(config::Environment::with_prefix("NEWMAN"))
      .set_override_option("url", args.url.clone())?
      .set_override_option("anon_key", args.anon_key.clone())?
      .set_override_option("local_path", args.local.as_deref().map(path_string))?
      .set_override_option("log_file", args.log_file.as_deref().map(path_string))?
      .set_override_option("log_level", args.log_level.clone())?
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise settings")?;

    Ok(Self {
      local_path: settings.local_path.as_deref().map(expand_tilde),
      log_file: expand_tilde(&settings.log_file),
      ..settings
    })
  }

  /// The configured backend. A local database file takes precedence;
  /// otherwise both the project URL and its anon key are required.
  pub fn backend(&self) -> anyhow::Result<BackendChoice> {
    if let Some(path) = &self.local_path {
      return Ok(BackendChoice::Local(path.clone()));
    }
    let url = self.url.as_deref().filter(|u| !u.trim().is_empty());
    let key = self.anon_key.as_deref().filter(|k| !k.trim().is_empty());
    match (url, key) {
      (Some(url), Some(key)) => Ok(BackendChoice::Supabase(SupabaseConfig::new(url, key))),
      (Some(_), None) => bail!("--url needs an anon key (--anon-key or NEWMAN_ANON_KEY)"),
      (None, Some(_)) => bail!("--anon-key needs a project URL (--url or NEWMAN_URL)"),
      (None, None) => bail!("no backend configured: pass --local FILE, or --url and --anon-key"),
    }
  }
}

fn default_log_file() -> PathBuf { std::env::temp_dir().join("newman.log") }

fn path_string(path: &Path) -> String { path.to_string_lossy().into_owned() }

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
