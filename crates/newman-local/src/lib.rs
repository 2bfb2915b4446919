//! SQLite backend for the Newman console.
//!
//! Accounts, the current session and every collection live in one SQLite
//! file. Records are stored as JSON documents so the same table serves
//! profiles, stores and messages. All database access runs on
//! [`tokio_rusqlite`]'s connection thread.

mod backend;
mod encode;
mod schema;

pub mod error;

pub use backend::LocalBackend;
pub use error::{Error, Result};
