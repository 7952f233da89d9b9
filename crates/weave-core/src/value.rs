//! # Dynamic values
//!
//! Everything that flows through a [`Context`](crate::Context) or the
//! [`ReactiveStore`](crate::ReactiveStore) is a [`Value`]. It covers the plain
//! data a binding usually reads (numbers, strings, nested maps and lists) plus
//! two handle kinds:
//!
//! - `Value::Scope` — a context handle, which is what `$parent` and `$root`
//!   evaluate to.
//! - `Value::Opaque` — any `Send + Sync` host type, read back with
//!   [`Value::downcast_ref`].
//!
//! ```rust
//! use weave_core::Value;
//!
//! let user = Value::map([("name", Value::from("Alice")), ("age", Value::from(31))]);
//! assert_eq!(user.get_path("name"), Some(Value::from("Alice")));
//! assert_eq!(user.get_path("age.years"), None);
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::scope::Scope;

/// String-keyed map used for scope data, nested objects and store snapshots.
pub type ValueMap = HashMap<String, Value>;

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    /// String-keyed container.
    Map(ValueMap),
    /// Generic-keyed container; keys are matched by their string form.
    Dict(Vec<(Value, Value)>),
    Scope(Scope),
    Opaque(Arc<dyn Any + Send + Sync>),
}

/// Outcome of walking a dotted path through nested values.
pub(crate) enum Lookup {
    Found(Value),
    /// A scope handle was reached with path segments left over.
    Delegate(Scope, String),
    Missing,
}

impl Value {
    /// Builds a `Value::Map` from key/value pairs.
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Wraps a host type so it can be stored and read back by type.
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Value::Opaque(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Opaque(any) => any.downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Dict(_) => "dict",
            Value::Scope(_) => "scope",
            Value::Opaque(_) => "opaque",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view used by expression arithmetic. Only `Int` and `Float`
    /// coerce; strings and bools do not.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Whether `child` can be called on this value at all.
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Map(_) | Value::Dict(_) | Value::List(_))
    }

    /// One navigation step: a map key, a dict key compared by string form, or
    /// a list index.
    pub fn child(&self, segment: &str) -> Option<&Value> {
        match self {
            Value::Map(m) => m.get(segment),
            Value::Dict(entries) => entries
                .iter()
                .find(|(k, _)| k.key_matches(segment))
                .map(|(_, v)| v),
            Value::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    pub(crate) fn key_matches(&self, segment: &str) -> bool {
        match self {
            Value::Str(s) => s == segment,
            Value::Int(i) => segment.parse::<i64>().is_ok_and(|n| n == *i),
            Value::Bool(b) => segment.parse::<bool>().is_ok_and(|n| n == *b),
            Value::Float(f) => segment.parse::<f64>().is_ok_and(|n| n == *f),
            _ => false,
        }
    }

    pub(crate) fn lookup(&self, segments: &[&str]) -> Lookup {
        let mut current = self;
        for (i, segment) in segments.iter().enumerate() {
            if let Value::Scope(scope) = current {
                return Lookup::Delegate(scope.clone(), segments[i..].join("."));
            }
            match current.child(segment) {
                Some(next) => current = next,
                None => return Lookup::Missing,
            }
        }
        Lookup::Found(current.clone())
    }

    /// Resolves a dotted path below this value. An empty path returns the
    /// value itself.
    pub fn get_path(&self, path: &str) -> Option<Value> {
        if path.is_empty() {
            return Some(self.clone());
        }
        let segments: Vec<&str> = path.split('.').collect();
        match self.lookup(&segments) {
            Lookup::Found(v) => Some(v),
            Lookup::Delegate(scope, rest) => crate::Context::get(&scope, &rest),
            Lookup::Missing => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            (Value::Scope(a), Value::Scope(b)) => a.same_scope(b),
            (Value::Opaque(a), Value::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Value::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Value::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Map(m) => f.debug_tuple("Map").field(m).finish(),
            Value::Dict(entries) => f.debug_tuple("Dict").field(entries).finish(),
            Value::Scope(s) => f.debug_tuple("Scope").field(&s.depth()).finish(),
            Value::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

/// Text rendering used for string coercion. `Null` renders as the empty
/// string; containers render in a compact bracketed form.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(_) | Value::Dict(_) => f.write_str("{..}"),
            Value::Scope(_) => f.write_str("<scope>"),
            Value::Opaque(_) => f.write_str("<opaque>"),
        }
    }
}

macro_rules! from_small_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(i64::from(v))
            }
        })*
    };
}

from_small_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! from_wide_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                match i64::try_from(v) {
                    Ok(i) => Value::Int(i),
                    Err(_) => Value::Float(v as f64),
                }
            }
        })*
    };
}

from_wide_int!(u64, usize, isize, i128, u128);

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<ValueMap> for Value {
    fn from(v: ValueMap) -> Self {
        Value::Map(v)
    }
}

impl From<Scope> for Value {
    fn from(v: Scope) -> Self {
        Value::Scope(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(feature = "json")]
mod json {
    use super::Value;

    impl From<serde_json::Value> for Value {
        fn from(v: serde_json::Value) -> Self {
            match v {
                serde_json::Value::Null => Value::Null,
                serde_json::Value::Bool(b) => Value::Bool(b),
                serde_json::Value::Number(n) => match n.as_i64() {
                    Some(i) => Value::Int(i),
                    None => Value::Float(n.as_f64().unwrap_or_default()),
                },
                serde_json::Value::String(s) => Value::Str(s),
                serde_json::Value::Array(items) => {
                    Value::List(items.into_iter().map(Value::from).collect())
                }
                serde_json::Value::Object(obj) => {
                    Value::Map(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
                }
            }
        }
    }

    /// Handles and non-finite floats have no JSON form and become `null`.
    impl From<&Value> for serde_json::Value {
        fn from(v: &Value) -> Self {
            match v {
                Value::Null | Value::Scope(_) | Value::Opaque(_) => serde_json::Value::Null,
                Value::Bool(b) => serde_json::Value::Bool(*b),
                Value::Int(i) => serde_json::Value::from(*i),
                Value::Float(f) => serde_json::Number::from_f64(*f)
                    .map_or(serde_json::Value::Null, serde_json::Value::Number),
                Value::Str(s) => serde_json::Value::String(s.clone()),
                Value::List(items) => {
                    serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
                }
                Value::Map(m) => serde_json::Value::Object(
                    m.iter()
                        .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                        .collect(),
                ),
                Value::Dict(entries) => serde_json::Value::Object(
                    entries
                        .iter()
                        .map(|(k, v)| (k.to_string(), serde_json::Value::from(v)))
                        .collect(),
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigates_maps_dicts_and_lists() {
        let v = Value::map([
            (
                "items",
                Value::List(vec![Value::map([("title", "first")]), Value::map([("title", "second")])]),
            ),
            (
                "codes",
                Value::Dict(vec![(Value::Int(7), Value::from("seven"))]),
            ),
        ]);

        assert_eq!(v.get_path("items.1.title"), Some(Value::from("second")));
        assert_eq!(v.get_path("codes.7"), Some(Value::from("seven")));
        assert_eq!(v.get_path("items.9"), None);
        assert_eq!(v.get_path("items.0.title.len"), None);
    }

    #[test]
    fn wide_integers_fall_back_to_float() {
        assert_eq!(Value::from(5u64), Value::Int(5));
        assert_eq!(Value::from(u64::MAX), Value::Float(u64::MAX as f64));
    }

    #[test]
    fn opaque_values_compare_by_identity() {
        #[derive(Debug, PartialEq)]
        struct Theme(u8);

        let a = Value::opaque(Theme(1));
        let b = Value::opaque(Theme(1));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.downcast_ref::<Theme>(), Some(&Theme(1)));
        assert_eq!(a.downcast_ref::<u8>(), None);
    }

    #[test]
    fn display_is_empty_for_null() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Float(3.0).to_string(), "3");
        assert_eq!(Value::from(vec![1, 2]).to_string(), "[1, 2]");
    }
}
