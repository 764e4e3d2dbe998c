//! JSON projection compiler.
//!
//! Compiles nested key/value or list descriptions into calls to the dialect's
//! JSON constructors (`json_object`/`json_array` on MySQL,
//! `json_build_object`/`json_build_array` on PostgreSQL).
//!
//! Text values are resolved by their separators: a value containing `:` is a
//! nested `key:value` object, a value containing only `,` is a positional
//! array, anything else is a field reference.
//!
//! # Example
//! ```ignore
//! use sqlfluent::{Dialect, JsonKind, JsonSpec, compile_json};
//!
//! let spec = JsonSpec::map([
//!     ("id", JsonSpec::from("id")),
//!     ("user", JsonSpec::map([("name", JsonSpec::from("u.name"))])),
//! ]);
//! let sql = compile_json(&Dialect::mysql(), &spec, JsonKind::Object)?;
//! assert_eq!(sql, "json_object('id', `id`, 'user', json_object('name', `u`.`name`))");
//! ```

use crate::dialect::Dialect;
use crate::error::{SqlError, SqlResult};
use crate::field::split_top_level;
use crate::value::Value;

/// Constructor to compile into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonKind {
    Object,
    Array,
}

/// Description of a JSON value built from columns.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonSpec {
    /// `"id, name:u.name"` style text.
    Text(String),
    /// Ordered elements, each compiled on its own.
    List(Vec<JsonSpec>),
    /// Ordered key/value pairs (objects only).
    Map(Vec<(String, JsonSpec)>),
    /// An escaped literal instead of a field reference.
    Literal(Value),
}

impl JsonSpec {
    pub fn map<K: Into<String>>(pairs: impl IntoIterator<Item = (K, JsonSpec)>) -> Self {
        JsonSpec::Map(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn list(items: impl IntoIterator<Item = JsonSpec>) -> Self {
        JsonSpec::List(items.into_iter().collect())
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        JsonSpec::Literal(value.into())
    }
}

impl From<&str> for JsonSpec {
    fn from(s: &str) -> Self {
        JsonSpec::Text(s.to_string())
    }
}

impl From<String> for JsonSpec {
    fn from(s: String) -> Self {
        JsonSpec::Text(s)
    }
}

/// Strings are field references, arrays are lists, objects are maps and
/// every other JSON scalar is a literal.
impl TryFrom<serde_json::Value> for JsonSpec {
    type Error = SqlError;

    fn try_from(v: serde_json::Value) -> SqlResult<Self> {
        match v {
            serde_json::Value::String(s) => Ok(JsonSpec::Text(s)),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(JsonSpec::try_from)
                .collect::<SqlResult<Vec<_>>>()
                .map(JsonSpec::List),
            serde_json::Value::Object(map) => map
                .into_iter()
                .map(|(k, v)| JsonSpec::try_from(v).map(|v| (k, v)))
                .collect::<SqlResult<Vec<_>>>()
                .map(JsonSpec::Map),
            scalar => Value::try_from(scalar).map(JsonSpec::Literal),
        }
    }
}

/// Compile `spec` into a JSON constructor call.
///
/// A constructor without arguments collapses to an empty string.
pub fn compile_json(dialect: &Dialect, spec: &JsonSpec, kind: JsonKind) -> SqlResult<String> {
    let compiler = JsonCompiler::new(dialect)?;
    let args = match kind {
        JsonKind::Object => compiler.object_args(spec)?,
        JsonKind::Array => compiler.array_args(spec)?,
    };
    if args.is_empty() {
        return Ok(String::new());
    }
    Ok(compiler.call(kind, &args))
}

struct JsonCompiler<'a> {
    dialect: &'a Dialect,
    object_fn: &'static str,
    array_fn: &'static str,
}

impl<'a> JsonCompiler<'a> {
    fn new(dialect: &'a Dialect) -> SqlResult<Self> {
        let (object_fn, array_fn) = dialect.json_functions()?;
        Ok(Self {
            dialect,
            object_fn,
            array_fn,
        })
    }

    fn call(&self, kind: JsonKind, args: &[String]) -> String {
        let name = match kind {
            JsonKind::Object => self.object_fn,
            JsonKind::Array => self.array_fn,
        };
        format!("{name}({})", args.join(", "))
    }

    /// Flattened `key, value, key, value, ...` arguments.
    fn object_args(&self, spec: &JsonSpec) -> SqlResult<Vec<String>> {
        let mut args = Vec::new();
        match spec {
            JsonSpec::Text(text) => {
                for item in items(text) {
                    let (key, value) = split_pair(item)?;
                    args.push(self.key(key)?);
                    args.push(self.text_value(value)?);
                }
            }
            JsonSpec::List(elements) => {
                for element in elements {
                    match element {
                        JsonSpec::Text(_) | JsonSpec::Map(_) => {
                            args.extend(self.object_args(element)?);
                        }
                        other => {
                            return Err(SqlError::json_ambiguous(format!(
                                "field name and value must be given for JSON objects: {other:?}"
                            )));
                        }
                    }
                }
            }
            JsonSpec::Map(pairs) => {
                for (key, value) in pairs {
                    args.push(self.key(key)?);
                    args.push(self.nested_value(value)?);
                }
            }
            JsonSpec::Literal(value) => {
                return Err(SqlError::json_ambiguous(format!(
                    "field name and value must be given for JSON objects: {value:?}"
                )));
            }
        }
        Ok(args)
    }

    fn array_args(&self, spec: &JsonSpec) -> SqlResult<Vec<String>> {
        match spec {
            JsonSpec::Text(text) => items(text)
                .into_iter()
                .map(|item| self.text_value(item))
                .collect(),
            JsonSpec::List(elements) => elements.iter().map(|e| self.nested_value(e)).collect(),
            JsonSpec::Map(_) => Err(SqlError::shape(
                "key/value mappings can only be compiled into JSON objects",
            )),
            JsonSpec::Literal(value) => Ok(vec![self.dialect.escape(value)?]),
        }
    }

    /// A value position: nested constructors are always emitted, even empty.
    fn nested_value(&self, spec: &JsonSpec) -> SqlResult<String> {
        match spec {
            JsonSpec::Text(text) => self.text_value(text),
            JsonSpec::Map(_) => Ok(self.call(JsonKind::Object, &self.object_args(spec)?)),
            JsonSpec::List(_) => Ok(self.call(JsonKind::Array, &self.array_args(spec)?)),
            JsonSpec::Literal(value) => self.dialect.escape(value),
        }
    }

    fn text_value(&self, text: &str) -> SqlResult<String> {
        let text = text.trim();
        if split_top_level(text, ':').len() > 1 {
            let spec = JsonSpec::Text(text.to_string());
            return Ok(self.call(JsonKind::Object, &self.object_args(&spec)?));
        }
        if split_top_level(text, ',').len() > 1 {
            let spec = JsonSpec::Text(text.to_string());
            return Ok(self.call(JsonKind::Array, &self.array_args(&spec)?));
        }
        if text.is_empty() {
            return Err(SqlError::json_ambiguous(
                "field name and value must be given for JSON objects",
            ));
        }
        self.dialect.escape_identifier(text)
    }

    fn key(&self, key: &str) -> SqlResult<String> {
        let key = key.trim();
        if key.is_empty() {
            return Err(SqlError::json_ambiguous(
                "field name and value must be given for JSON objects",
            ));
        }
        self.dialect.escape(&Value::Text(key.to_string()))
    }
}

/// Non-empty comma-separated items.
fn items(text: &str) -> Vec<&str> {
    split_top_level(text, ',')
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Split `key:value` on the first top-level colon.
fn split_pair(item: &str) -> SqlResult<(&str, &str)> {
    match item.split_once(':') {
        Some((key, value)) if !key.trim().is_empty() && !value.trim().is_empty() => {
            Ok((key, value))
        }
        _ => Err(SqlError::json_ambiguous(format!(
            "field name and value must be given for JSON objects: '{item}'"
        ))),
    }
}
