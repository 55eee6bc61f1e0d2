//! Store-agnostic query description.
//!
//! A [`Query`] names a collection, a conjunction of [`Predicate`]s, an
//! optional ordering and an optional limit. It carries no behaviour beyond
//! [`Query::matches`], the reference evaluator that in-process stores use and
//! that database stores must agree with.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Named document collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    Listings,
    Agencies,
    Users,
    Credentials,
    TourRequests,
    Inquiries,
    Activities,
}

impl Collection {
    pub const ALL: [Self; 7] = [
        Self::Listings,
        Self::Agencies,
        Self::Users,
        Self::Credentials,
        Self::TourRequests,
        Self::Inquiries,
        Self::Activities,
    ];

    /// Collection name as stored.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Listings => "listings",
            Self::Agencies => "agencies",
            Self::Users => "users",
            Self::Credentials => "credentials",
            Self::TourRequests => "tourRequests",
            Self::Inquiries => "inquiries",
            Self::Activities => "activities",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A literal compared against a document field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// JSON form of the literal. Non-finite floats become `null`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Integer(n) => Value::from(*n),
            Self::Float(x) => serde_json::Number::from_f64(*x).map_or(Value::Null, Value::Number),
            Self::Text(s) => Value::String(s.clone()),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Float(x) => Some(*x),
            Self::Bool(_) | Self::Text(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(Self::Float(f64::MAX), Self::Integer)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// One condition on a top-level document field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    /// `field == value`.
    Eq { field: String, value: FieldValue },
    /// `field >= value`.
    Gte { field: String, value: FieldValue },
    /// `field <= value`.
    Lte { field: String, value: FieldValue },
    /// `fields[0] == value OR fields[1] == value OR ...`.
    AnyOf { fields: Vec<String>, value: FieldValue },
}

impl Predicate {
    /// Evaluate against a JSON object. Missing fields never match.
    #[must_use]
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Self::Eq { field, value } => doc.get(field).is_some_and(|v| json_eq(v, value)),
            Self::Gte { field, value } => doc
                .get(field)
                .and_then(|v| json_cmp(v, value))
                .is_some_and(Ordering::is_ge),
            Self::Lte { field, value } => doc
                .get(field)
                .and_then(|v| json_cmp(v, value))
                .is_some_and(Ordering::is_le),
            Self::AnyOf { fields, value } => fields
                .iter()
                .any(|field| doc.get(field).is_some_and(|v| json_eq(v, value))),
        }
    }

    /// Fields this predicate reads.
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Self::Eq { field, .. } | Self::Gte { field, .. } | Self::Lte { field, .. } => {
                vec![field.as_str()]
            }
            Self::AnyOf { fields, .. } => fields.iter().map(String::as_str).collect(),
        }
    }
}

fn json_eq(doc_value: &Value, literal: &FieldValue) -> bool {
    match (doc_value, literal) {
        (Value::String(s), FieldValue::Text(t)) => s == t,
        (Value::Bool(a), FieldValue::Bool(b)) => a == b,
        (Value::Number(n), lit) => match (n.as_f64(), lit.as_f64()) {
            (Some(a), Some(b)) => (a - b).abs() < f64::EPSILON,
            _ => false,
        },
        _ => false,
    }
}

/// Numbers compare numerically and strings lexicographically. Anything else
/// is incomparable.
fn json_cmp(doc_value: &Value, literal: &FieldValue) -> Option<Ordering> {
    match (doc_value, literal) {
        (Value::String(s), FieldValue::Text(t)) => Some(s.as_str().cmp(t.as_str())),
        (Value::Number(n), lit) => n.as_f64()?.partial_cmp(&lit.as_f64()?),
        _ => None,
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Field and direction to sort results by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// A lazy query over one collection.
///
/// Building a query performs no I/O; a document store evaluates it once and
/// returns a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub collection: Collection,
    pub predicates: Vec<Predicate>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    /// Unfiltered query over `collection`.
    #[must_use]
    pub const fn new(collection: Collection) -> Self {
        Self {
            collection,
            predicates: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    #[must_use]
    pub fn eq(self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.filter(Predicate::Eq {
            field: field.into(),
            value: value.into(),
        })
    }

    #[must_use]
    pub fn gte(self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.filter(Predicate::Gte {
            field: field.into(),
            value: value.into(),
        })
    }

    #[must_use]
    pub fn lte(self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.filter(Predicate::Lte {
            field: field.into(),
            value: value.into(),
        })
    }

    #[must_use]
    pub fn any_of<I, S>(self, fields: I, value: impl Into<FieldValue>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter(Predicate::AnyOf {
            fields: fields.into_iter().map(Into::into).collect(),
            value: value.into(),
        })
    }

    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `doc` satisfies every predicate.
    #[must_use]
    pub fn matches(&self, doc: &Value) -> bool {
        self.predicates.iter().all(|p| p.matches(doc))
    }

    /// Order two documents by this query's sort field. Documents missing the
    /// field sort last regardless of direction.
    #[must_use]
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let Some(order) = &self.order_by else {
            return Ordering::Equal;
        };
        let ordering = match (a.get(&order.field), b.get(&order.field)) {
            (None | Some(Value::Null), None | Some(Value::Null)) => return Ordering::Equal,
            (None | Some(Value::Null), _) => return Ordering::Greater,
            (_, None | Some(Value::Null)) => return Ordering::Less,
            (Some(x), Some(y)) => compare_values(x, y),
        };
        match order.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_eq_is_exact_for_strings() {
        let p = Predicate::Eq {
            field: "city".into(),
            value: "chatan".into(),
        };
        assert!(p.matches(&json!({ "city": "chatan" })));
        assert!(!p.matches(&json!({ "city": "Chatan" })));
        assert!(!p.matches(&json!({})));
    }

    #[test]
    fn test_range_accepts_ints_and_floats() {
        let q = Query::new(Collection::Listings)
            .gte("bathrooms", 1.5)
            .lte("price", 200_000_u64);
        assert!(q.matches(&json!({ "bathrooms": 2, "price": 150_000 })));
        assert!(q.matches(&json!({ "bathrooms": 1.5, "price": 200_000.0 })));
        assert!(!q.matches(&json!({ "bathrooms": 1, "price": 150_000 })));
        assert!(!q.matches(&json!({ "bathrooms": "2", "price": 150_000 })));
    }

    #[test]
    fn test_any_of_matches_either_field() {
        let q = Query::new(Collection::Listings).any_of(["listingType", "propertyType"], "house");
        assert!(q.matches(&json!({ "listingType": "house" })));
        assert!(q.matches(&json!({ "propertyType": "house" })));
        assert!(!q.matches(&json!({ "listingType": "apartment", "propertyType": "condo" })));
    }

    #[test]
    fn test_empty_query_matches_everything() {
        assert!(Query::new(Collection::Agencies).matches(&json!({})));
    }

    #[test]
    fn test_compare_sorts_missing_last() {
        let q = Query::new(Collection::Listings).order_by("createdAt", Direction::Desc);
        let newer = json!({ "createdAt": "2025-03-05T00:00:00Z" });
        let older = json!({ "createdAt": "2025-01-01T00:00:00Z" });
        let missing = json!({});
        assert_eq!(q.compare(&newer, &older), Ordering::Less);
        assert_eq!(q.compare(&missing, &older), Ordering::Greater);
        assert_eq!(q.compare(&older, &missing), Ordering::Less);
    }

    #[test]
    fn test_collection_names() {
        assert_eq!(Collection::TourRequests.as_str(), "tourRequests");
        assert_eq!(Collection::Listings.to_string(), "listings");
    }
}
