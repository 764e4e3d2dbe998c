//! SQL identifier handling.
//!
//! This module provides [`Ident`] which represents a SQL identifier
//! (schema/table/column), supporting dotted notation and already-quoted parts.
//!
//! - Every part is re-quoted with the dialect's quote character on output.
//! - Parts given already quoted (with `"` or `` ` ``) keep their exact content,
//!   which is how names containing a `.` are expressed.
//! - A trailing `*` part stays unquoted (`u.*`).

use crate::error::{SqlError, SqlResult};

/// A part of a SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentPart {
    /// Named part, stored unescaped.
    Name(String),
    /// `*` wildcard, only valid as the last part.
    Wildcard,
}

/// A SQL identifier (column, table, or schema name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub parts: Vec<IdentPart>,
}

impl Ident {
    /// Parse an identifier string, supporting dotted and quoted forms.
    ///
    /// - Dotted: `schema.table.column`
    /// - Quoted: `"Camel.Case"` or `` `Camel.Case` ``
    /// - Wildcard: `*`, `u.*`
    pub fn parse(s: &str) -> SqlResult<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SqlError::shape("identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(SqlError::shape("identifier cannot contain NUL character"));
        }

        let mut parts = Vec::new();
        let mut chars = s.chars().peekable();

        while chars.peek().is_some() {
            if !parts.is_empty() {
                match chars.next() {
                    Some('.') => {
                        if chars.peek().is_none() {
                            return Err(SqlError::shape(format!("trailing '.' in identifier '{s}'")));
                        }
                    }
                    Some(c) => {
                        return Err(SqlError::shape(format!(
                            "expected '.' between identifier parts of '{s}', got '{c}'"
                        )));
                    }
                    None => break,
                }
            }
            if parts.last() == Some(&IdentPart::Wildcard) {
                return Err(SqlError::shape(format!("'*' must be the last part of '{s}'")));
            }

            // Quoted part: the closing quote is escaped by doubling.
            if let Some(&quote) = chars.peek().filter(|c| **c == '"' || **c == '`') {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some(c) if c == quote => {
                            if chars.peek() == Some(&quote) {
                                chars.next();
                                name.push(quote);
                            } else {
                                break;
                            }
                        }
                        Some(c) => name.push(c),
                        None => {
                            return Err(SqlError::shape(format!(
                                "unclosed quoted identifier in '{s}'"
                            )));
                        }
                    }
                }
                if name.is_empty() {
                    return Err(SqlError::shape(format!("empty quoted identifier in '{s}'")));
                }
                parts.push(IdentPart::Name(name));
                continue;
            }

            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                name.push(c);
                chars.next();
            }
            let name = name.trim();
            match name {
                "" => {
                    return Err(SqlError::shape(format!("empty identifier segment in '{s}'")));
                }
                "*" => parts.push(IdentPart::Wildcard),
                _ => parts.push(IdentPart::Name(name.to_string())),
            }
        }

        Ok(Self { parts })
    }

    /// Render the identifier quoting every named part with `quote`.
    pub fn to_sql(&self, quote: char) -> String {
        let mut out = String::new();
        self.write_sql(quote, &mut out);
        out
    }

    pub(crate) fn write_sql(&self, quote: char, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match part {
                IdentPart::Wildcard => out.push('*'),
                IdentPart::Name(s) => {
                    out.push(quote);
                    for ch in s.chars() {
                        if ch == quote {
                            out.push(quote);
                        }
                        out.push(ch);
                    }
                    out.push(quote);
                }
            }
        }
    }
}
