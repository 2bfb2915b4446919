//! PostgREST: filtered, ordered, ranged reads plus insert and delete.

use newman_core::{
  query::{Direction, Filter, Page, RowRange, Select},
  record::{Collection, Draft, Record},
};
use reqwest::{Method, StatusCode, header::HeaderMap};
use uuid::Uuid;

use crate::{
  Error, Result,
  http::{Http, check},
};

// ─── Query rendering ─────────────────────────────────────────────────────────

/// `field=eq.value`
pub fn filter_param(filter: &Filter) -> (String, String) {
  (filter.field.clone(), format!("eq.{}", filter.value_text()))
}

/// Query-string pairs for a [`Select`]. The range travels in headers.
pub fn select_params(select: &Select) -> Vec<(String, String)> {
  let mut params = vec![("select".to_owned(), "*".to_owned())];
  if let Some(filter) = &select.filter {
    params.push(filter_param(filter));
  }
  if let Some(order) = &select.order {
    let direction = match order.direction {
      Direction::Ascending => "asc",
      Direction::Descending => "desc",
    };
    params.push(("order".to_owned(), format!("{}.{direction}", order.field)));
  }
  params
}

/// `Range` header value for an inclusive row window.
pub fn range_header(range: RowRange) -> String { format!("{}-{}", range.from, range.to) }

/// The total after the slash of a `Content-Range` header (`0-9/25`,
/// `*/25`). `None` when the server did not count (`0-9/*`).
pub fn parse_content_range(value: &str) -> Result<Option<u64>> {
  let (_, total) = value
    .split_once('/')
    .ok_or_else(|| Error::ContentRange(value.to_owned()))?;
  match total.trim() {
    "*" => Ok(None),
    n => n
      .parse()
      .map(Some)
      .map_err(|_| Error::ContentRange(value.to_owned())),
  }
}

fn content_range_total(headers: &HeaderMap) -> Result<Option<u64>> {
  match headers.get("content-range") {
    Some(value) => {
      let value = value
        .to_str()
        .map_err(|_| Error::ContentRange(format!("{value:?}")))?;
      parse_content_range(value)
    }
    None => Ok(None),
  }
}

// ─── Requests ────────────────────────────────────────────────────────────────

impl Http {
  /// `POST /rest/v1/{collection}` with `Prefer: return=minimal`.
  pub async fn insert<D: Draft>(&self, bearer: Option<&str>, records: &[D]) -> Result<()> {
    let url = self.config().rest_url(D::COLLECTION.as_ref());
    let resp = self
      .request(Method::POST, &url, bearer)
      .header("Prefer", "return=minimal")
      .json(records)
      .send()
      .await?;
    check(resp).await?;
    Ok(())
  }

  /// `GET /rest/v1/{collection}?select=*&…` with `Range` and, when counting,
  /// `Prefer: count=exact`.
  ///
  /// A window starting past the last row answers 416; that is an empty page
  /// whose total still comes from `Content-Range`.
  pub async fn select<R: Record>(&self, bearer: Option<&str>, select: &Select) -> Result<Page<R>> {
    let url = self.config().rest_url(R::COLLECTION.as_ref());
    let mut req = self
      .request(Method::GET, &url, bearer)
      .query(&select_params(select));
    if let Some(range) = select.range {
      req = req
        .header("Range-Unit", "items")
        .header("Range", range_header(range));
    }
    if select.count {
      req = req.header("Prefer", "count=exact");
    }

    let resp = req.send().await?;
    if resp.status() == StatusCode::RANGE_NOT_SATISFIABLE {
      let total = content_range_total(resp.headers())?;
      return Ok(Page::empty(total));
    }
    let resp = check(resp).await?;
    let total = if select.count {
      content_range_total(resp.headers())?
    } else {
      None
    };
    let rows: Vec<R> = resp.json().await?;
    Ok(Page { rows, total })
  }

  /// First row matching `filter`.
  pub async fn select_first<R: Record>(
    &self,
    bearer: Option<&str>,
    filter: Filter,
  ) -> Result<Option<R>> {
    let select = Select::all()
      .filter(filter)
      .range(RowRange::new(0, 0));
    let page = self.select::<R>(bearer, &select).await?;
    Ok(page.rows.into_iter().next())
  }

  /// `DELETE /rest/v1/{collection}?id=eq.{id}`
  pub async fn delete(&self, bearer: Option<&str>, collection: Collection, id: Uuid) -> Result<()> {
    let url = self.config().rest_url(collection.as_ref());
    let (field, value) = filter_param(&Filter::eq("id", id.to_string()));
    let resp = self
      .request(Method::DELETE, &url, bearer)
      .query(&[(field, value)])
      .send()
      .await?;
    check(resp).await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use newman_core::{page::page_range, query::Order};

  use super::*;

  #[test]
  fn message_page_query() {
    let user = Uuid::new_v4();
    let select = Select::all()
      .filter(Filter::eq("user_id", user.to_string()))
      .order(Order::desc("date_created"))
      .range(page_range(3))
      .with_count();

    assert_eq!(
      select_params(&select),
      vec![
        ("select".to_owned(), "*".to_owned()),
        ("user_id".to_owned(), format!("eq.{user}")),
        ("order".to_owned(), "date_created.desc".to_owned()),
      ]
    );
    assert_eq!(range_header(page_range(3)), "20-29");
  }

  #[test]
  fn store_list_query_has_no_filter() {
    let select = Select::all().order(Order::asc("name"));
    assert_eq!(
      select_params(&select),
      vec![
        ("select".to_owned(), "*".to_owned()),
        ("order".to_owned(), "name.asc".to_owned()),
      ]
    );
  }

  #[test]
  fn non_string_filters_render_as_json() {
    assert_eq!(
      filter_param(&Filter::eq("active", true)),
      ("active".to_owned(), "eq.true".to_owned())
    );
  }

  #[test]
  fn content_range_totals() {
    assert_eq!(parse_content_range("0-9/25").unwrap(), Some(25));
    assert_eq!(parse_content_range("*/0").unwrap(), Some(0));
    assert_eq!(parse_content_range("*/12").unwrap(), Some(12));
    assert_eq!(parse_content_range("0-9/*").unwrap(), None);
    assert!(matches!(
      parse_content_range("garbage"),
      Err(Error::ContentRange(_))
    ));
    assert!(parse_content_range("0-9/many").is_err());
  }
}
