//! Dynamic representation of persistable application state
//!
//! Every value a settings document can hold is a variant of [`Value`]:
//! null, one of the built-in scalars, or an arbitrarily nested array/map of
//! those. Dispatch in the codec layer is exhaustive matching over this enum,
//! so there is no "unregistered type falls through" path at the value level.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::types::{FontSpec, Point, Rect};

/// One persistable value
///
/// Maps are a `Vec` of key/value pairs: entry order is preserved on write
/// and reconstructed on read, and is considered significant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Null,
    Text(String),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    Point(Point),
    Rect(Rect),
    Font(FontSpec),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Build an array value from anything iterable
    pub fn array<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Array(items.into_iter().map(Into::into).collect())
    }

    /// Build a map value, preserving the iteration order of `entries`
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Point> for Value {
    fn from(v: Point) -> Self {
        Value::Point(v)
    }
}

impl From<Rect> for Value {
    fn from(v: Rect) -> Self {
        Value::Rect(v)
    }
}

impl From<FontSpec> for Value {
    fn from(v: FontSpec) -> Self {
        Value::Font(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::array(v)
    }
}

// Sets have no dedicated shape: they are persisted as ordered element
// sequences. BTreeSet gives a deterministic order; hash sets must be
// ordered by the caller before conversion.
impl<T: Into<Value> + Ord> From<BTreeSet<T>> for Value {
    fn from(v: BTreeSet<T>) -> Self {
        Value::array(v)
    }
}

impl<K: Into<Value> + Ord, V: Into<Value>> From<BTreeMap<K, V>> for Value {
    fn from(v: BTreeMap<K, V>) -> Self {
        Value::map(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_from_vec() {
        let v: Value = vec!["a", "b", "c"].into();
        assert_eq!(
            v,
            Value::Array(vec![
                Value::Text("a".to_string()),
                Value::Text("b".to_string()),
                Value::Text("c".to_string()),
            ])
        );
    }

    #[test]
    fn test_map_preserves_entry_order() {
        let v = Value::map([("wrap", Value::Bool(true)), ("tabWidth", Value::Int(4))]);
        let Value::Map(entries) = v else {
            panic!("expected map");
        };
        assert_eq!(entries[0].0, Value::Text("wrap".to_string()));
        assert_eq!(entries[1].0, Value::Text("tabWidth".to_string()));
    }

    #[test]
    fn test_set_becomes_ordered_array() {
        let set = BTreeSet::from(["c", "a", "b"]);
        let v: Value = set.into();
        assert_eq!(v, Value::array(["a", "b", "c"]));
    }
}
