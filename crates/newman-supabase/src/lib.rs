//! Supabase backend for the Newman console.
//!
//! Accounts and sessions go through GoTrue (`/auth/v1`), collections through
//! PostgREST (`/rest/v1`). The issued session is held in memory only and
//! renewed shortly before it expires.

mod auth;
mod backend;
mod http;
mod rest;

pub mod config;
pub mod error;

pub use backend::SupabaseBackend;
pub use config::SupabaseConfig;
pub use error::{Error, Result};
