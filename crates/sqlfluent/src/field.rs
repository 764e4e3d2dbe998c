//! Field arguments and their normalization into escaped SQL.

use crate::clause::{Fragment, Part};
use crate::dialect::Dialect;
use crate::error::{SqlError, SqlResult};
use crate::statement::Statement;

/// A field argument accepted by select lists, grouping, ordering and joins.
#[derive(Debug, Clone)]
pub enum Field {
    /// Comma-separated names, e.g. `"id, u.name AS author"`.
    Text(String),
    /// Ordered names, each escaped on its own.
    List(Vec<String>),
    /// Nested statement or raw SQL, rendered in parentheses.
    Sub(Subquery),
    /// A single identifier, never split on commas.
    Ident(String),
}

/// The parenthesized forms a [`Field::Sub`] can take.
#[derive(Debug, Clone)]
pub enum Subquery {
    Statement(Box<Statement>),
    /// Raw SQL fragment.
    ///
    /// # Safety
    /// Be careful with SQL injection when using raw fragments.
    Sql(String),
}

impl Field {
    /// A single identifier that bypasses comma splitting.
    pub fn ident(name: impl Into<String>) -> Self {
        Field::Ident(name.into())
    }

    /// A raw SQL fragment used verbatim inside parentheses.
    pub fn raw(sql: impl Into<String>) -> Self {
        Field::Sub(Subquery::Sql(sql.into()))
    }

    /// Whether this is a nested statement that has no alias.
    pub(crate) fn is_unaliased_statement(&self) -> bool {
        matches!(self, Field::Sub(Subquery::Statement(s)) if s.alias_name().is_none())
    }
}

impl From<&str> for Field {
    fn from(s: &str) -> Self {
        Field::Text(s.to_string())
    }
}

impl From<String> for Field {
    fn from(s: String) -> Self {
        Field::Text(s)
    }
}

impl From<Vec<String>> for Field {
    fn from(v: Vec<String>) -> Self {
        Field::List(v)
    }
}

impl From<Vec<&str>> for Field {
    fn from(v: Vec<&str>) -> Self {
        Field::List(v.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Field {
    fn from(v: &[&str]) -> Self {
        Field::List(v.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Field {
    fn from(v: [&str; N]) -> Self {
        Field::List(v.iter().map(|s| s.to_string()).collect())
    }
}

impl From<Statement> for Field {
    fn from(s: Statement) -> Self {
        Field::Sub(Subquery::Statement(Box::new(s)))
    }
}

/// Normalize a field into one fragment per item.
pub fn normalize_field(dialect: &Dialect, field: &Field) -> SqlResult<Vec<Fragment>> {
    match field {
        Field::Text(text) => {
            let mut out = Vec::new();
            for segment in split_top_level(text, ',') {
                out.push(Fragment::sql(escape_aliased(dialect, segment, text)?));
            }
            Ok(out)
        }
        Field::List(names) => {
            if names.is_empty() {
                return Err(SqlError::shape("field list cannot be empty"));
            }
            names
                .iter()
                .map(|name| escape_aliased(dialect, name, name).map(Fragment::sql))
                .collect()
        }
        Field::Ident(name) => Ok(vec![Fragment::sql(dialect.escape_identifier(name)?)]),
        Field::Sub(Subquery::Sql(sql)) => Ok(vec![Fragment::sql(format!("({sql})"))]),
        Field::Sub(Subquery::Statement(stmt)) => {
            let mut fragment = Fragment::from_parts(vec![Part::Sub(Box::new(stmt.nested_snapshot(dialect)?))]);
            if let Some(alias) = stmt.alias_name() {
                fragment = fragment.suffixed(format!(" AS {}", dialect.escape_identifier(alias)?));
            }
            Ok(vec![fragment])
        }
    }
}

/// Normalize a field and join its items with `, `.
pub fn normalize_field_joined(dialect: &Dialect, field: &Field) -> SqlResult<Fragment> {
    let mut items = normalize_field(dialect, field)?.into_iter();
    let mut joined = items
        .next()
        .ok_or_else(|| SqlError::shape("field cannot be empty"))?;
    for item in items {
        joined.extend(item.prefixed(", "));
    }
    Ok(joined)
}

/// Escape `name` or `name AS alias`.
fn escape_aliased(dialect: &Dialect, segment: &str, whole: &str) -> SqlResult<String> {
    let segment = segment.trim();
    if segment.is_empty() {
        return Err(SqlError::shape(format!("empty field in '{whole}'")));
    }
    match find_alias(segment) {
        Some((name, alias)) => Ok(format!(
            "{} AS {}",
            dialect.escape_identifier(name)?,
            dialect.escape_identifier(alias)?
        )),
        None => dialect.escape_identifier(segment),
    }
}

/// Split `name AS alias` (keyword matched case-insensitively).
fn find_alias(segment: &str) -> Option<(&str, &str)> {
    let lower = segment.to_ascii_lowercase();
    let pos = lower.rfind(" as ")?;
    let (name, alias) = (segment[..pos].trim(), segment[pos + 4..].trim());
    (!name.is_empty() && !alias.is_empty()).then_some((name, alias))
}

/// Split on `sep` outside parentheses and quotes.
pub(crate) fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth -= 1,
            (None, c) if c == sep && depth == 0 => {
                out.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    out.push(&s[start..]);
    out
}
