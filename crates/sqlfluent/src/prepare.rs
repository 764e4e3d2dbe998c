//! Placeholder expansion.
//!
//! Templates use three placeholder forms, consumed left to right:
//!
//! - `??` quotes the next parameter as an identifier
//! - `(?)` expands the next parameter into a parenthesized literal list
//! - `?` escapes the next parameter as a literal (a list becomes `a, b, c`)
//!
//! Substituted text is never scanned again, so a `?` inside an escaped string
//! parameter is not treated as a placeholder. Excess parameters are ignored.

use crate::dialect::Dialect;
use crate::error::{SqlError, SqlResult};
use crate::value::Value;

/// Expand `template` against `params` using the escaping rules of `dialect`.
///
/// # Example
/// ```ignore
/// use sqlfluent::{Dialect, params, prepare};
///
/// let sql = prepare(&Dialect::mysql(), "?? = ?", &params!["id", 5])?;
/// assert_eq!(sql, "`id` = 5");
/// ```
pub fn prepare(dialect: &Dialect, template: &str, params: &[Value]) -> SqlResult<String> {
    let mut out = String::with_capacity(template.len() + params.len() * 4);
    let mut index = 0usize;
    let mut rest = template;

    while let Some(pos) = rest.find(['?', '(']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("(?)") {
            let value = take(template, params, &mut index, "(?)")?;
            out.push('(');
            out.push_str(&expand_list(dialect, value)?);
            out.push(')');
            rest = &tail[3..];
        } else if tail.starts_with("??") {
            let value = take(template, params, &mut index, "??")?;
            out.push_str(&expand_identifier(dialect, value)?);
            rest = &tail[2..];
        } else if tail.starts_with('?') {
            let value = take(template, params, &mut index, "?")?;
            out.push_str(&dialect.escape(value)?);
            rest = &tail[1..];
        } else {
            // A '(' that does not open a `(?)` placeholder.
            out.push('(');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);

    Ok(out)
}

fn take<'a>(
    template: &str,
    params: &'a [Value],
    index: &mut usize,
    placeholder: &str,
) -> SqlResult<&'a Value> {
    let value = params.get(*index).ok_or_else(|| {
        SqlError::PlaceholderMismatch(format!(
            "template '{template}' needs a parameter for placeholder #{} ('{placeholder}') but only {} given",
            *index + 1,
            params.len()
        ))
    })?;
    *index += 1;
    Ok(value)
}

fn expand_identifier(dialect: &Dialect, value: &Value) -> SqlResult<String> {
    match value {
        Value::Text(name) | Value::Ident(name) => dialect.escape_identifier(name),
        Value::List(names) => {
            let mut escaped = Vec::with_capacity(names.len());
            for name in names {
                escaped.push(expand_identifier(dialect, name)?);
            }
            Ok(escaped.join(", "))
        }
        other => Err(SqlError::shape(format!(
            "'??' expects an identifier, got {}",
            other.shape_name()
        ))),
    }
}

fn expand_list(dialect: &Dialect, value: &Value) -> SqlResult<String> {
    match value {
        Value::List(items) if items.is_empty() => Ok("NULL".to_string()),
        Value::List(items) => dialect.escape_list(items),
        other => dialect.escape(other),
    }
}
