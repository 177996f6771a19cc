//! # Dynamic Values
//!
//! Typed agents (`PolyAgent<S, A, B>`) cover most uses, but an operad has to
//! hold agents of different static types in one table and feed them to the
//! same operations. [`Value`] is the common currency for that: an ordered,
//! hashable, serializable value that can stand in for positions, inputs and
//! outputs alike.
//!
//! [`Datum`] is the bridge between the two worlds. Anything implementing it
//! can be erased into a [`crate::DynAgent`] via [`crate::PolyAgent::into_dyn`].
//!
//! ```rust
//! use polyagent_core::value::{Datum, Value};
//!
//! let v = (3i64, true).to_value();
//! assert_eq!(v, Value::Tuple(vec![Value::Int(3), Value::Bool(true)]));
//! assert_eq!(<(i64, bool)>::from_value(&v), Some((3, true)));
//! ```

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A dynamically typed position, input or output.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Value {
    Unit,
    Bool(bool),
    Int(i64),
    Text(String),
    Tuple(Vec<Value>),
}

impl Value {
    /// Build a two-element tuple.
    pub fn pair(left: Value, right: Value) -> Self {
        Value::Tuple(vec![left, right])
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Short name of the variant, used in type mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Text(_) => "text",
            Value::Tuple(_) => "tuple",
        }
    }

    /// Flatten nested tuples into a single tuple.
    ///
    /// `((a, b), c)` and `(a, (b, c))` both become `(a, b, c)`, which is
    /// what "equal up to re-nesting" means for parallel composition.
    /// Non-tuple values are returned unchanged.
    pub fn flatten(&self) -> Value {
        match self {
            Value::Tuple(_) => {
                let mut out = Vec::new();
                self.flatten_into(&mut out);
                Value::Tuple(out)
            }
            other => other.clone(),
        }
    }

    fn flatten_into(&self, out: &mut Vec<Value>) {
        match self {
            Value::Tuple(items) => {
                for item in items {
                    item.flatten_into(out);
                }
            }
            other => out.push(other.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Unit
    }
}

// ============================================================================
// Datum
// ============================================================================

/// A Rust type with a lossless encoding into [`Value`].
///
/// `from_value` returns `None` when the value has the wrong shape; erased
/// agents turn that into `InvalidState` or `InvalidInput`.
pub trait Datum: Sized {
    fn to_value(&self) -> Value;
    fn from_value(value: &Value) -> Option<Self>;
}

impl Datum for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl Datum for () {
    fn to_value(&self) -> Value {
        Value::Unit
    }

    fn from_value(value: &Value) -> Option<Self> {
        matches!(value, Value::Unit).then_some(())
    }
}

impl Datum for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl Datum for i64 {
    fn to_value(&self) -> Value {
        Value::Int(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_int()
    }
}

impl Datum for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_text().map(str::to_string)
    }
}

impl<X: Datum, Y: Datum> Datum for (X, Y) {
    fn to_value(&self) -> Value {
        Value::pair(self.0.to_value(), self.1.to_value())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value.as_tuple()? {
            [x, y] => Some((X::from_value(x)?, Y::from_value(y)?)),
            _ => None,
        }
    }
}

impl<T: Datum> Datum for Vec<T> {
    fn to_value(&self) -> Value {
        Value::Tuple(self.iter().map(Datum::to_value).collect())
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_tuple()?.iter().map(T::from_value).collect()
    }
}

// ============================================================================
// Products
// ============================================================================

/// Cartesian product of position sets, each element a `Value::Tuple`.
///
/// An empty slice yields the single empty tuple, the unit of the product.
pub fn cartesian(sets: &[&BTreeSet<Value>]) -> BTreeSet<Value> {
    let mut rows: Vec<Vec<Value>> = vec![Vec::new()];
    for set in sets {
        let mut next = Vec::with_capacity(rows.len() * set.len());
        for row in &rows {
            for item in set.iter() {
                let mut extended = row.clone();
                extended.push(item.clone());
                next.push(extended);
            }
        }
        rows = next;
    }
    rows.into_iter().map(Value::Tuple).collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_reassociates() {
        let (a, b, c) = (Value::Int(1), Value::Int(2), Value::Int(3));
        let left = Value::pair(Value::pair(a.clone(), b.clone()), c.clone());
        let right = Value::pair(a, Value::pair(b, c));
        assert_ne!(left, right);
        assert_eq!(left.flatten(), right.flatten());
        assert_eq!(
            left.flatten(),
            Value::Tuple(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
    }

    #[test]
    fn test_flatten_scalar_unchanged() {
        assert_eq!(Value::Int(7).flatten(), Value::Int(7));
    }

    #[test]
    fn test_datum_pair_roundtrip() {
        let v = ((), 4i64).to_value();
        assert_eq!(<((), i64)>::from_value(&v), Some(((), 4)));
        assert_eq!(<(i64, i64)>::from_value(&v), None);
    }

    #[test]
    fn test_datum_vec_rejects_mixed() {
        let v = Value::Tuple(vec![Value::Int(1), Value::Bool(true)]);
        assert_eq!(Vec::<i64>::from_value(&v), None);
    }

    #[test]
    fn test_cartesian_sizes() {
        let a: BTreeSet<Value> = [Value::Int(0), Value::Int(1)].into_iter().collect();
        let b: BTreeSet<Value> = [Value::from("x"), Value::from("y"), Value::from("z")]
            .into_iter()
            .collect();
        assert_eq!(cartesian(&[&a, &b]).len(), 6);
        assert_eq!(cartesian(&[]).len(), 1);
    }

    #[test]
    fn test_display() {
        let v = Value::pair(Value::from("a"), Value::Unit);
        assert_eq!(format!("{}", v), "(\"a\", ())");
    }
}
