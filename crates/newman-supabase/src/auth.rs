//! GoTrue: account creation, password and refresh-token grants, logout.

use chrono::{DateTime, Duration, Utc};
use newman_core::identity::{Account, Session};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use crate::{
  Result,
  http::{Http, check},
};

/// A successful grant.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
  pub access_token:  String,
  pub refresh_token: String,
  /// Lifetime in seconds.
  #[serde(default)]
  pub expires_in:    Option<i64>,
  /// Unix seconds.
  #[serde(default)]
  pub expires_at:    Option<i64>,
  pub user:          Account,
}

impl TokenResponse {
  /// The session this grant establishes, anchoring a relative lifetime at
  /// `now`.
  pub fn into_session(self, now: DateTime<Utc>) -> Session {
    let expires_at = self
      .expires_at
      .and_then(|secs| DateTime::from_timestamp(secs, 0))
      .or_else(|| self.expires_in.map(|secs| now + Duration::seconds(secs)));
    Session {
      access_token: self.access_token,
      refresh_token: self.refresh_token,
      expires_at,
      account: self.user,
    }
  }
}

/// `signup` answers with a session when the project signs new accounts in
/// straight away, and with the bare user when it wants email confirmation.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
  Session(TokenResponse),
  User(Account),
}

/// What creating an account produced.
#[derive(Debug)]
pub struct SignUp {
  pub account: Account,
  pub session: Option<Session>,
}

impl SignUpResponse {
  pub fn into_sign_up(self, now: DateTime<Utc>) -> SignUp {
    match self {
      Self::Session(grant) => {
        let session = grant.into_session(now);
        SignUp {
          account: session.account.clone(),
          session: Some(session),
        }
      }
      Self::User(account) => SignUp {
        account,
        session: None,
      },
    }
  }
}

impl Http {
  /// `POST /auth/v1/signup`
  pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUp> {
    let resp = self
      .request(Method::POST, &self.config().auth_url("signup"), None)
      .json(&json!({ "email": email, "password": password }))
      .send()
      .await?;
    let body: SignUpResponse = check(resp).await?.json().await?;
    Ok(body.into_sign_up(Utc::now()))
  }

  /// `POST /auth/v1/token?grant_type=password`
  pub async fn password_grant(&self, email: &str, password: &str) -> Result<Session> {
    self
      .grant("password", json!({ "email": email, "password": password }))
      .await
  }

  /// `POST /auth/v1/token?grant_type=refresh_token`
  pub async fn refresh_grant(&self, refresh_token: &str) -> Result<Session> {
    self
      .grant("refresh_token", json!({ "refresh_token": refresh_token }))
      .await
  }

  async fn grant(&self, grant_type: &str, body: serde_json::Value) -> Result<Session> {
    let resp = self
      .request(Method::POST, &self.config().auth_url("token"), None)
      .query(&[("grant_type", grant_type)])
      .json(&body)
      .send()
      .await?;
    let grant: TokenResponse = check(resp).await?.json().await?;
    Ok(grant.into_session(Utc::now()))
  }

  /// `POST /auth/v1/logout`, revoking `access_token`'s refresh tokens.
  pub async fn logout(&self, access_token: &str) -> Result<()> {
    let resp = self
      .request(Method::POST, &self.config().auth_url("logout"), Some(access_token))
      .send()
      .await?;
    check(resp).await?;
    Ok(())
  }
}
