//! Pagination arithmetic for the message list.

use std::ops::RangeInclusive;

use crate::query::RowRange;

/// Messages shown per page.
pub const PAGE_SIZE: u64 = 10;

/// Numbered page buttons shown at once.
pub const MAX_VISIBLE_PAGES: u64 = 5;

/// Page count for `total` matching rows. An empty result is still one
/// (empty) page.
pub fn total_pages(total: u64) -> u64 { total.div_ceil(PAGE_SIZE).max(1) }

/// The inclusive row window for 1-based `page`.
pub fn page_range(page: u64) -> RowRange {
  let from = page.max(1).saturating_sub(1) * PAGE_SIZE;
  RowRange::new(from, from + PAGE_SIZE - 1)
}

/// Position within a paginated list, and the controls derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
  /// 1-based.
  pub current:     u64,
  pub total_pages: u64,
}

impl Default for Pagination {
  fn default() -> Self {
    Self {
      current:     1,
      total_pages: 1,
    }
  }
}

impl Pagination {
  pub fn new(current: u64, total_pages: u64) -> Self {
    Self {
      current:     current.max(1),
      total_pages: total_pages.max(1),
    }
  }

  pub fn has_previous(&self) -> bool { self.current > 1 }

  pub fn has_next(&self) -> bool { self.current < self.total_pages }

  pub fn previous(&self) -> Option<u64> {
    self.has_previous().then(|| self.current - 1)
  }

  pub fn next(&self) -> Option<u64> { self.has_next().then(|| self.current + 1) }

  /// Up to [`MAX_VISIBLE_PAGES`] page numbers centred on the current page,
  /// shifted to stay inside `1..=total_pages`.
  pub fn window(&self) -> RangeInclusive<u64> {
    let span = MAX_VISIBLE_PAGES - 1;
    let start = self.current.saturating_sub(MAX_VISIBLE_PAGES / 2).max(1);
    let end = (start + span).min(self.total_pages);
    let start = end.saturating_sub(span).max(1);
    start..=end
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn window(current: u64, total: u64) -> Vec<u64> {
    Pagination::new(current, total).window().collect()
  }

  #[test]
  fn window_centres_on_current_page() {
    assert_eq!(window(7, 20), [5, 6, 7, 8, 9]);
  }

  #[test]
  fn window_clamps_at_both_ends() {
    assert_eq!(window(1, 20), [1, 2, 3, 4, 5]);
    assert_eq!(window(2, 20), [1, 2, 3, 4, 5]);
    assert_eq!(window(20, 20), [16, 17, 18, 19, 20]);
    assert_eq!(window(19, 20), [16, 17, 18, 19, 20]);
  }

  #[test]
  fn window_shrinks_with_few_pages() {
    assert_eq!(window(1, 1), [1]);
    assert_eq!(window(2, 3), [1, 2, 3]);
  }

  #[test]
  fn total_pages_never_drops_below_one() {
    assert_eq!(total_pages(0), 1);
    assert_eq!(total_pages(1), 1);
    assert_eq!(total_pages(10), 1);
    assert_eq!(total_pages(11), 2);
    assert_eq!(total_pages(200), 20);
  }

  #[test]
  fn total_pages_matches_ceiling_for_all_small_counts() {
    for n in 0..=105u64 {
      let expected = std::cmp::max(1, (n + PAGE_SIZE - 1) / PAGE_SIZE);
      assert_eq!(total_pages(n), expected, "n = {n}");
    }
  }

  #[test]
  fn page_range_windows_ten_rows() {
    assert_eq!(page_range(1), RowRange::new(0, 9));
    assert_eq!(page_range(3), RowRange::new(20, 29));
    assert_eq!(page_range(0), RowRange::new(0, 9));
  }

  #[test]
  fn previous_and_next_respect_bounds() {
    let first = Pagination::new(1, 3);
    assert!(!first.has_previous());
    assert_eq!(first.next(), Some(2));

    let last = Pagination::new(3, 3);
    assert!(!last.has_next());
    assert_eq!(last.previous(), Some(2));
  }
}
