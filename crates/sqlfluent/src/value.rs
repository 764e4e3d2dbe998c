//! Bindable values for placeholders and inline literals.
//!
//! Every value that ends up in generated SQL goes through [`Value`] and is
//! escaped by the statement's [`Dialect`](crate::Dialect). There is no way to
//! splice unescaped text except the explicit [`Value::Raw`] escape hatch.

use crate::error::{SqlError, SqlResult};
use serde::{Deserialize, Serialize};

/// A value that can be bound to a `?`, `??` or `(?)` placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value. Must be finite when escaped.
    Float(f64),
    /// Text value.
    Text(String),
    /// Ordered sequence of scalars (`IN (...)`, multi-value inserts).
    List(Vec<Value>),
    /// Raw identifier marker: escaped as a single (possibly dotted) identifier.
    Ident(String),
    /// Raw SQL fragment, emitted verbatim.
    ///
    /// # Safety
    /// Be careful with SQL injection when using raw fragments.
    Raw(String),
}

impl Value {
    /// Create a raw identifier marker.
    pub fn ident(name: impl Into<String>) -> Self {
        Value::Ident(name.into())
    }

    /// Create a raw SQL fragment.
    pub fn raw(sql: impl Into<String>) -> Self {
        Value::Raw(sql.into())
    }

    /// Create a list value from anything convertible into values.
    pub fn list<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Whether this value is a single scalar literal.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Text(_)
        )
    }

    /// Short name of the variant, used in error messages.
    pub(crate) fn shape_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::List(_) => "list",
            Value::Ident(_) => "identifier",
            Value::Raw(_) => "raw sql",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Int(i64::from(v))
    }
}

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

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::list(v)
    }
}

impl<T: Into<Value> + Clone> From<&[T]> for Value {
    fn from(v: &[T]) -> Self {
        Value::list(v.iter().cloned())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(v: [T; N]) -> Self {
        Value::list(v)
    }
}

/// JSON input (e.g. request payloads) converts directly; objects have no
/// placeholder form and are rejected.
impl TryFrom<serde_json::Value> for Value {
    type Error = SqlError;

    fn try_from(v: serde_json::Value) -> SqlResult<Self> {
        match v {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Float(f))
                } else {
                    Err(SqlError::shape(format!("number {n} does not fit an i64 or f64")))
                }
            }
            serde_json::Value::String(s) => Ok(Value::Text(s)),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(Value::try_from)
                .collect::<SqlResult<Vec<_>>>()
                .map(Value::List),
            serde_json::Value::Object(_) => Err(SqlError::shape(
                "JSON objects cannot be bound to a placeholder",
            )),
        }
    }
}

/// Build a `Vec<Value>` from heterogeneous expressions.
///
/// ```ignore
/// let p = sqlfluent::params!["id", 5, vec![1, 2, 3]];
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($value)),+]
    };
}
