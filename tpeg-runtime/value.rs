//! Semantic values computed while parsing.

use indexmap::IndexMap;
use std::fmt::{self, Display};
use std::ops::Index;
use std::sync::Arc;

/// The value computed for a matched expression.
///
/// Statically shaped expressions only ever produce the variant their shape
/// describes; heterogeneous sequences and choices produce whichever variant the
/// matched sub-expression produced.
///
/// List items are shared: cloning a value does not copy its list.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    /// No value: an optional that did not match, or a `*` that matched zero times.
    #[default]
    Absent,
    Bool(bool),
    Text(String),
    Int(i64),
    Float(f64),
    List(Arc<[Value]>),
    Map(IndexMap<String, Value>),
}

impl Value {
    pub fn list(items: Vec<Value>) -> Value {
        Value::List(items.into())
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(&l[..]),
            _ => None,
        }
    }

    /// The list elements, treating `Absent` as the empty list.
    pub fn items(&self) -> &[Value] {
        match self {
            Value::List(l) => &l[..],
            _ => &[],
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Text(s)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Value {
        Value::Text(c.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Value {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Value {
        Value::Float(f)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Value {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Value {
        v.map_or(Value::Absent, Into::into)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Absent => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// The labels bound so far in the current alternative, in binding order.
///
/// A label bound more than once (for example inside a repetition) resolves to
/// its most recent value.
#[derive(Clone, Copy, Debug)]
pub struct Bindings<'a> {
    slots: &'a [(&'a str, Value)],
}

impl<'a> Bindings<'a> {
    pub fn new(slots: &'a [(&'a str, Value)]) -> Self {
        Bindings { slots }
    }

    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.slots.iter().rev().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
        self.slots.iter().map(|(n, v)| (*n, v))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<'a> Index<&str> for Bindings<'a> {
    type Output = Value;

    fn index(&self, name: &str) -> &Value {
        match self.get(name) {
            Some(v) => v,
            None => panic!("label `{}` is not bound", name),
        }
    }
}
