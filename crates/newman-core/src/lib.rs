//! Core types and trait definitions for the Newman operations console.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! backend crates implement [`backend::Backend`]; `newman-console` drives it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod backend;
pub mod error;
pub mod identity;
pub mod message;
pub mod page;
pub mod query;
pub mod record;
pub mod store;
pub mod targeting;
pub mod validate;

pub use error::{Error, Result};
