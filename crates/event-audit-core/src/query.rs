//! The query model: filters, sorting, page windows and index specs.
//!
//! A [`Query`] is data. Backends either evaluate it in process
//! ([`Filter::matches`], [`compare_values`]) or compile it to their own
//! query language; both must agree on the semantics documented here.
//!
//! ## Ordering
//!
//! Values order as: missing or null, then numbers (booleans count as 0 and 1),
//! then strings and nested values (compared as JSON text, byte-wise). Documents
//! with equal sort keys keep insertion order, which makes page windows stable.
//!
//! Numbers are 64-bit signed integers or doubles, as in SQLite. An integer
//! beyond the `i64` range orders by its nearest double, so two such integers
//! that round to the same double tie.
//!
//! ## Range filters
//!
//! [`Filter::Gte`] only matches fields holding an integer in the `i64` range.
//! Floats, out-of-range integers, booleans, strings and null never match.

use std::borrow::Cow;
use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::document::Document;

/// Which documents a query selects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Filter {
    /// Every document in the collection.
    #[default]
    All,
    /// Documents whose `field` is an `i64` integer `>= value`.
    ///
    /// Documents where the field is missing, null or anything else never match.
    Gte { field: String, value: i64 },
}

impl Filter {
    pub fn gte(field: impl Into<String>, value: i64) -> Self {
        Filter::Gte {
            field: field.into(),
            value,
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Gte { field, value } => doc
                .get(field)
                .and_then(Value::as_i64)
                .is_some_and(|n| n >= *value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// Sort order on a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub direction: Direction,
}

impl Sort {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }

    /// Compare two documents by this sort key.
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let ord = compare_values(a.get(&self.field), b.get(&self.field));
        match self.direction {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        }
    }
}

/// An offset/limit page window.
///
/// A zero limit selects nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Page {
    pub offset: u64,
    pub limit: u64,
}

impl Page {
    pub const fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// The first page of the given size.
    pub const fn first(limit: u64) -> Self {
        Self::new(0, limit)
    }

    /// Page `number` (zero-based) of the given size.
    pub const fn numbered(number: u64, size: u64) -> Self {
        Self::new(number.saturating_mul(size), size)
    }

    /// The page immediately after this one.
    pub const fn next(&self) -> Self {
        Self::new(self.offset.saturating_add(self.limit), self.limit)
    }

    /// Apply this window to an already filtered and sorted sequence.
    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let offset = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);
        items.into_iter().skip(offset).take(limit).collect()
    }
}

/// A filter, an optional sort and an optional page window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub filter: Filter,
    pub sort: Option<Sort>,
    pub page: Option<Page>,
}

impl Query {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            sort: None,
            page: None,
        }
    }

    pub fn all() -> Self {
        Self::new(Filter::All)
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn page(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }
}

/// A composite ascending, non-unique index over document fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexSpec {
    fields: Vec<String>,
}

impl IndexSpec {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// The index every event collection carries.
    pub fn event_default() -> Self {
        Self::new(["type", "dataType", "source", "id"])
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Stable name derived from the field list.
    pub fn name(&self) -> String {
        format!("idx_{}", self.fields.join("_"))
    }
}

/// Total order over optional JSON values used for sorting.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (sort_key(a), sort_key(b)) {
        (SortKey::Null, SortKey::Null) => Ordering::Equal,
        (SortKey::Number(x), SortKey::Number(y)) => compare_numbers(&x, &y),
        (SortKey::Text(x), SortKey::Text(y)) => x.as_bytes().cmp(y.as_bytes()),
        (x, y) => x.rank().cmp(&y.rank()),
    }
}

/// Compare two JSON numbers the way SQLite compares its numeric values.
fn compare_numbers(a: &Number, b: &Number) -> Ordering {
    match (SqlNumber::from(a), SqlNumber::from(b)) {
        (SqlNumber::Integer(x), SqlNumber::Integer(y)) => x.cmp(&y),
        (SqlNumber::Real(x), SqlNumber::Real(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (SqlNumber::Integer(x), SqlNumber::Real(y)) => compare_integer_real(x, y),
        (SqlNumber::Real(x), SqlNumber::Integer(y)) => compare_integer_real(y, x).reverse(),
    }
}

/// Exact comparison of an integer against a double.
fn compare_integer_real(i: i64, r: f64) -> Ordering {
    // 2^63, the first double above every i64.
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    if r >= TWO_POW_63 {
        return Ordering::Less;
    }
    if r < -TWO_POW_63 {
        return Ordering::Greater;
    }
    let truncated = r.trunc();
    // In range, so the cast is exact.
    match i.cmp(&(truncated as i64)) {
        Ordering::Equal => 0.0f64.total_cmp(&(r - truncated)),
        ord => ord,
    }
}

#[derive(Clone, Copy)]
enum SqlNumber {
    Integer(i64),
    Real(f64),
}

impl From<&Number> for SqlNumber {
    fn from(n: &Number) -> Self {
        match n.as_i64() {
            Some(i) => SqlNumber::Integer(i),
            None => SqlNumber::Real(n.as_f64().unwrap_or(0.0)),
        }
    }
}

enum SortKey<'a> {
    Null,
    Number(Number),
    Text(Cow<'a, str>),
}

impl SortKey<'_> {
    fn rank(&self) -> u8 {
        match self {
            SortKey::Null => 0,
            SortKey::Number(_) => 1,
            SortKey::Text(_) => 2,
        }
    }
}

fn sort_key(value: Option<&Value>) -> SortKey<'_> {
    match value {
        None | Some(Value::Null) => SortKey::Null,
        Some(Value::Bool(b)) => SortKey::Number(Number::from(u8::from(*b))),
        Some(Value::Number(n)) => SortKey::Number(n.clone()),
        Some(Value::String(s)) => SortKey::Text(Cow::Borrowed(s.as_str())),
        Some(other) => SortKey::Text(Cow::Owned(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        Document::from_value(value).unwrap()
    }

    #[test]
    fn test_gte_is_inclusive() {
        let filter = Filter::gte("id", 10);
        assert!(filter.matches(&doc(json!({"id": 10}))));
        assert!(filter.matches(&doc(json!({"id": 11}))));
        assert!(!filter.matches(&doc(json!({"id": 9}))));
    }

    #[test]
    fn test_gte_excludes_non_numbers() {
        let filter = Filter::gte("id", 0);
        assert!(!filter.matches(&doc(json!({}))));
        assert!(!filter.matches(&doc(json!({"id": null}))));
        assert!(!filter.matches(&doc(json!({"id": "12"}))));
        assert!(!filter.matches(&doc(json!({"id": true}))));
        assert!(!filter.matches(&doc(json!({"id": 0.5}))));
        assert!(!filter.matches(&doc(json!({"id": 12.0}))));
    }

    #[test]
    fn test_gte_only_matches_i64_integers() {
        let filter = Filter::gte("id", i64::MAX);
        assert!(filter.matches(&doc(json!({"id": i64::MAX}))));
        assert!(!filter.matches(&doc(json!({"id": u64::MAX}))));
        assert!(!filter.matches(&doc(json!({"id": (i64::MAX as u64) + 1}))));
        assert!(!filter.matches(&doc(json!({"id": -1}))));

        let filter = Filter::gte("id", i64::MIN);
        assert!(filter.matches(&doc(json!({"id": i64::MIN}))));
    }

    #[test]
    fn test_numbers_order_like_sqlite() {
        let ord = |a: Value, b: Value| compare_values(Some(&a), Some(&b));

        // Integers past i64 collapse to the same double and tie.
        assert_eq!(ord(json!(u64::MAX - 1), json!(u64::MAX)), Ordering::Equal);
        assert_eq!(ord(json!(i64::MAX), json!(u64::MAX)), Ordering::Less);
        assert_eq!(ord(json!(i64::MAX), json!(9.223372036854775807e18)), Ordering::Less);

        // Integer against double is exact.
        assert_eq!(
            ord(json!(9_007_199_254_740_993i64), json!(9_007_199_254_740_992.0)),
            Ordering::Greater
        );
        assert_eq!(ord(json!(2), json!(2.5)), Ordering::Less);
        assert_eq!(ord(json!(-2), json!(-2.5)), Ordering::Greater);
        assert_eq!(ord(json!(3), json!(3.0)), Ordering::Equal);
        assert_eq!(ord(json!(0.0), json!(-0.0)), Ordering::Equal);
        assert_eq!(ord(json!(true), json!(1)), Ordering::Equal);
    }

    #[test]
    fn test_value_ordering() {
        let values = [json!(null), json!(-3), json!(2.5), json!(7), json!("a"), json!("b")];
        for pair in values.windows(2) {
            assert_eq!(
                compare_values(Some(&pair[0]), Some(&pair[1])),
                Ordering::Less,
                "{} < {}",
                pair[0],
                pair[1]
            );
        }
        assert_eq!(compare_values(None, Some(&json!(null))), Ordering::Equal);
    }

    #[test]
    fn test_sort_direction() {
        let a = doc(json!({"id": 1}));
        let b = doc(json!({"id": 2}));
        assert_eq!(Sort::ascending("id").compare(&a, &b), Ordering::Less);
        assert_eq!(Sort::descending("id").compare(&a, &b), Ordering::Greater);
    }

    #[test]
    fn test_page_window() {
        let items: Vec<u32> = (0..10).collect();
        assert_eq!(Page::first(3).apply(items.clone()), vec![0, 1, 2]);
        assert_eq!(Page::first(3).next().apply(items.clone()), vec![3, 4, 5]);
        assert_eq!(Page::numbered(3, 3).apply(items.clone()), vec![9]);
        assert!(Page::new(20, 3).apply(items.clone()).is_empty());
        assert!(Page::first(0).apply(items).is_empty());
    }

    #[test]
    fn test_default_index() {
        let spec = IndexSpec::event_default();
        assert_eq!(spec.fields(), ["type", "dataType", "source", "id"]);
        assert_eq!(spec.name(), "idx_type_dataType_source_id");
    }
}
