//! Display helpers shared by the message screens.

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone, Utc};
use uuid::Uuid;

const EXCERPT_CHARS: usize = 50;

/// First eight characters of the id, then `...`.
pub fn short_id(id: Uuid) -> String {
  let mut s = id.to_string();
  s.truncate(8);
  s.push_str("...");
  s
}

/// Creation time in the operator's local time zone.
pub fn format_date(at: DateTime<Utc>) -> String { format_date_in(at, &Local) }

fn format_date_in<Tz>(at: DateTime<Utc>, tz: &Tz) -> String
where
  Tz: TimeZone,
  Tz::Offset: Display,
{
  at.with_timezone(tz).format("%b %d, %Y, %I:%M %p").to_string()
}

/// The body cut to 50 characters, with `...` when anything was cut.
pub fn excerpt(body: &str) -> String {
  match body.char_indices().nth(EXCERPT_CHARS) {
    Some((cut, _)) => format!("{}...", &body[..cut]),
    None => body.to_owned(),
  }
}

#[cfg(test)]
mod tests {
  use chrono::FixedOffset;

  use super::*;

  #[test]
  fn ids_are_shortened() {
    let id = Uuid::parse_str("3f2b8c1a-0000-4000-8000-000000000000").unwrap();
    assert_eq!(short_id(id), "3f2b8c1a...");
  }

  #[test]
  fn dates_are_long_form_twelve_hour() {
    let at = Utc.with_ymd_and_hms(2024, 3, 7, 14, 5, 0).unwrap();
    assert_eq!(format_date_in(at, &Utc), "Mar 07, 2024, 02:05 PM");

    let east = FixedOffset::east_opt(10 * 3600).unwrap();
    assert_eq!(format_date_in(at, &east), "Mar 08, 2024, 12:05 AM");
  }

  #[test]
  fn long_bodies_are_cut_at_fifty_characters() {
    let body = "é".repeat(60);
    let cut = excerpt(&body);
    assert_eq!(cut.chars().count(), 53);
    assert!(cut.ends_with("..."));

    let exact = "x".repeat(50);
    assert_eq!(excerpt(&exact), exact);
    assert_eq!(excerpt("short"), "short");
  }
}
