//! Query parameters understood by every [`Backend`](crate::backend::Backend).

use serde_json::Value;

// ─── Filter ──────────────────────────────────────────────────────────────────

/// An equality filter on one field of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
  pub field: String,
  pub value: Value,
}

impl Filter {
  pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
    Self {
      field: field.into(),
      value: value.into(),
    }
  }

  /// The value as it appears in a query string: strings bare, everything
  /// else as JSON.
  pub fn value_text(&self) -> String {
    match &self.value {
      Value::String(s) => s.clone(),
      other => other.to_string(),
    }
  }
}

// ─── Ordering ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  Ascending,
  Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
  pub field:     String,
  pub direction: Direction,
}

impl Order {
  pub fn asc(field: impl Into<String>) -> Self {
    Self {
      field:     field.into(),
      direction: Direction::Ascending,
    }
  }

  pub fn desc(field: impl Into<String>) -> Self {
    Self {
      field:     field.into(),
      direction: Direction::Descending,
    }
  }
}

// ─── Range ───────────────────────────────────────────────────────────────────

/// An inclusive row window `[from, to]` over the ordered result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
  pub from: u64,
  pub to:   u64,
}

impl RowRange {
  pub fn new(from: u64, to: u64) -> Self { Self { from, to } }

  /// Number of rows the window can hold.
  pub fn len(&self) -> u64 { self.to.saturating_sub(self.from) + 1 }

  pub fn is_empty(&self) -> bool { self.to < self.from }
}

// ─── Select ──────────────────────────────────────────────────────────────────

/// Parameters for [`Backend::select_page`](crate::backend::Backend::select_page).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Select {
  pub filter: Option<Filter>,
  pub order:  Option<Order>,
  pub range:  Option<RowRange>,
  /// Ask the backend for the total number of matching rows.
  pub count:  bool,
}

impl Select {
  pub fn all() -> Self { Self::default() }

  pub fn filter(mut self, filter: Filter) -> Self {
    self.filter = Some(filter);
    self
  }

  pub fn order(mut self, order: Order) -> Self {
    self.order = Some(order);
    self
  }

  pub fn range(mut self, range: RowRange) -> Self {
    self.range = Some(range);
    self
  }

  pub fn with_count(mut self) -> Self {
    self.count = true;
    self
  }
}

/// One window of rows, plus the total match count when it was requested.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
  pub rows:  Vec<R>,
  pub total: Option<u64>,
}

impl<R> Page<R> {
  pub fn empty(total: Option<u64>) -> Self {
    Self {
      rows: Vec::new(),
      total,
    }
  }
}
