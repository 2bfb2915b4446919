//! Route Guard: whether a screen may render given the session state.

use crate::session::AuthState;

/// Console routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
  /// `/`, which always forwards to the message list.
  Root,
  SignIn,
  Register,
  Messages,
  CreateMessage,
}

impl Route {
  /// Routes that need a signed-in account.
  pub fn is_protected(self) -> bool {
    matches!(self, Self::Root | Self::Messages | Self::CreateMessage)
  }

  pub fn path(self) -> &'static str {
    match self {
      Self::Root => "/",
      Self::SignIn => "/login",
      Self::Register => "/register",
      Self::Messages => "/messages",
      Self::CreateMessage => "/create-message",
    }
  }
}

/// What to show for a requested route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
  /// The first session lookup is still pending.
  Loading,
  /// Show a different route instead.
  Redirect(Route),
  Render(Route),
}

/// Decide what to show for `route`. A pure function of `state`.
pub fn gate(route: Route, state: &AuthState) -> Gate {
  if route == Route::Root {
    return Gate::Redirect(Route::Messages);
  }
  if !route.is_protected() {
    return Gate::Render(route);
  }
  if state.loading {
    Gate::Loading
  } else if !state.is_signed_in() {
    Gate::Redirect(Route::SignIn)
  } else {
    Gate::Render(route)
  }
}
