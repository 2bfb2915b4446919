//! The console's behaviour, independent of how it is drawn.
//!
//! * [`session::SessionManager`] owns who is signed in.
//! * [`guard`] decides whether a route may render.
//! * [`messages::MessageList`] pages through the signed-in account's messages.
//! * [`composer::Composer`] builds and submits a new message.
//!
//! Everything here is generic over [`newman_core::backend::Backend`].

pub mod composer;
pub mod guard;
pub mod messages;
pub mod scope;
pub mod session;

pub use scope::Scope;
pub use session::{AuthState, SessionManager};

#[cfg(test)]
mod tests;
