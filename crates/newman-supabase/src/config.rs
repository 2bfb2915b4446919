//! Connection settings for a hosted Supabase project.

use std::fmt;

/// Project URL and the public anonymous key.
#[derive(Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
  /// e.g. `https://abcdefgh.supabase.co`
  pub url:      String,
  pub anon_key: String,
}

impl SupabaseConfig {
  pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
    Self {
      url:      url.into(),
      anon_key: anon_key.into(),
    }
  }

  /// `{url}/auth/v1/{path}`
  pub fn auth_url(&self, path: &str) -> String { self.endpoint("auth/v1", path) }

  /// `{url}/rest/v1/{table}`
  pub fn rest_url(&self, table: &str) -> String { self.endpoint("rest/v1", table) }

  fn endpoint(&self, service: &str, path: &str) -> String {
    format!(
      "{}/{service}/{}",
      self.url.trim_end_matches('/'),
      path.trim_start_matches('/')
    )
  }
}

impl fmt::Debug for SupabaseConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SupabaseConfig")
      .field("url", &self.url)
      .field("anon_key", &"<redacted>")
      .finish()
  }
}
