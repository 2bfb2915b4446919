//! Shared HTTP plumbing: one `reqwest` client, Supabase headers and status
//! checking.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};

use crate::{Result, SupabaseConfig, error::api_error};

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct Http {
  client: Client,
  config: SupabaseConfig,
}

impl Http {
  pub fn new(config: SupabaseConfig) -> Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, config })
  }

  pub fn config(&self) -> &SupabaseConfig { &self.config }

  /// A request carrying the project key, authorised as `bearer` (an access
  /// token) or anonymously.
  pub fn request(&self, method: Method, url: &str, bearer: Option<&str>) -> RequestBuilder {
    let token = bearer.unwrap_or(&self.config.anon_key);
    self
      .client
      .request(method, url)
      .header("apikey", &self.config.anon_key)
      .bearer_auth(token)
  }
}

/// Pass successful responses through; turn anything else into
/// [`Error::Api`](crate::Error::Api).
pub async fn check(resp: Response) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let body = resp.text().await.unwrap_or_default();
  Err(api_error(status.as_u16(), &body))
}
