//! Store targeting: which stores a new message is addressed to.
//!
//! The three strategies are mutually exclusive. Each variant owns its own
//! selection, so switching strategy replaces the whole value and nothing
//! typed or ticked under one strategy survives into another.

use crate::store::Store;

/// The strategy an operator picked, without its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumIter)]
pub enum TargetKind {
  /// Type comma-separated store codes.
  Manual,
  /// Tick stores on a checklist.
  List,
  /// Every known store.
  All,
}

impl TargetKind {
  pub fn label(self) -> &'static str {
    match self {
      Self::Manual => "Enter list of stores",
      Self::List => "Choose stores from list",
      Self::All => "Send to all stores",
    }
  }

  pub fn hint(self) -> &'static str {
    match self {
      Self::Manual => "Manually enter store codes",
      Self::List => "Select from available stores",
      Self::All => "Select all available stores",
    }
  }
}

/// Targeting state of the composer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Targeting {
  /// No strategy chosen yet.
  #[default]
  Unset,
  Manual {
    /// Raw text being typed.
    input:    String,
    /// Whether the input box is still shown. Confirming hides it.
    editing:  bool,
    selected: Vec<String>,
  },
  List {
    /// Whether the checklist is shown.
    open:     bool,
    selected: Vec<String>,
  },
  All {
    selected: Vec<String>,
  },
}

impl Targeting {
  /// Start a fresh strategy. `stores` is the reference list, only read by
  /// [`TargetKind::All`].
  pub fn switch_to(kind: TargetKind, stores: &[Store]) -> Self {
    match kind {
      TargetKind::Manual => Self::Manual {
        input:    String::new(),
        editing:  true,
        selected: Vec::new(),
      },
      TargetKind::List => Self::List {
        open:     true,
        selected: Vec::new(),
      },
      TargetKind::All => Self::All {
        selected: stores.iter().map(|s| s.code.clone()).collect(),
      },
    }
  }

  pub fn kind(&self) -> Option<TargetKind> {
    match self {
      Self::Unset => None,
      Self::Manual { .. } => Some(TargetKind::Manual),
      Self::List { .. } => Some(TargetKind::List),
      Self::All { .. } => Some(TargetKind::All),
    }
  }

  /// The store codes a submitted message would carry, in selection order.
  pub fn selected(&self) -> &[String] {
    match self {
      Self::Unset => &[],
      Self::Manual { selected, .. }
      | Self::List { selected, .. }
      | Self::All { selected } => selected.as_slice(),
    }
  }

  /// Remove every occurrence of `code` from the selection, whatever the
  /// strategy. The result may differ from what the strategy itself would
  /// produce. Returns whether anything was removed.
  pub fn remove(&mut self, code: &str) -> bool {
    let selected = match self {
      Self::Unset => return false,
      Self::Manual { selected, .. }
      | Self::List { selected, .. }
      | Self::All { selected } => selected,
    };
    let before = selected.len();
    selected.retain(|c| c != code);
    selected.len() != before
  }

  /// Checklist toggle: append `code` when absent, drop it when present.
  /// Ignored outside [`TargetKind::List`].
  pub fn toggle(&mut self, code: &str) -> bool {
    let Self::List { selected, .. } = self else {
      return false;
    };
    if selected.iter().any(|c| c == code) {
      selected.retain(|c| c != code);
    } else {
      selected.push(code.to_owned());
    }
    true
  }

  pub fn is_checked(&self, code: &str) -> bool {
    self.selected().iter().any(|c| c == code)
  }

  /// The manual input buffer while it is being edited.
  pub fn manual_input_mut(&mut self) -> Option<&mut String> {
    match self {
      Self::Manual {
        input,
        editing: true,
        ..
      } => Some(input),
      _ => None,
    }
  }

  /// Turn the typed text into the selection and hide the input. Blank input
  /// is ignored. Returns whether the selection was replaced.
  pub fn confirm_manual(&mut self) -> bool {
    let Self::Manual {
      input,
      editing,
      selected,
    } = self
    else {
      return false;
    };
    if input.trim().is_empty() {
      return false;
    }
    *selected = parse_store_codes(input);
    *editing = false;
    true
  }

  /// Hide the manual input without touching the selection.
  pub fn close_manual(&mut self) {
    if let Self::Manual { editing, .. } = self {
      *editing = false;
    }
  }

  /// Hide the checklist, keeping what was ticked.
  pub fn close_list(&mut self) {
    if let Self::List { open, .. } = self {
      *open = false;
    }
  }

  pub fn is_list_open(&self) -> bool { matches!(self, Self::List { open: true, .. }) }

  pub fn is_editing_manual(&self) -> bool {
    matches!(self, Self::Manual { editing: true, .. })
  }
}

/// Split comma-separated codes, trimming each and dropping empty tokens.
/// Duplicates are kept.
pub fn parse_store_codes(input: &str) -> Vec<String> {
  input
    .split(',')
    .map(str::trim)
    .filter(|code| !code.is_empty())
    .map(str::to_owned)
    .collect()
}
