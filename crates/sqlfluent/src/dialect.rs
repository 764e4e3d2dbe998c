//! Dialect capability object.
//!
//! Everything that differs between the supported engines lives on [`Dialect`]:
//! quoting, literal escaping, JSON constructor names and their version gate,
//! full-text predicates and LIMIT syntax. Builders consult the dialect instead
//! of branching on an engine tag themselves.

use crate::error::{SqlError, SqlResult};
use crate::ident::Ident;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Supported SQL engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialectKind {
    /// MySQL / MariaDB style syntax.
    #[serde(rename = "mysql")]
    MySql,
    /// PostgreSQL style syntax.
    Postgres,
}

impl DialectKind {
    /// Name reported to callers (`dialectName`).
    pub fn name(self) -> &'static str {
        match self {
            DialectKind::MySql => "mysql",
            DialectKind::Postgres => "postgres",
        }
    }

    fn json_threshold(self) -> ServerVersion {
        match self {
            DialectKind::MySql => ServerVersion::new(5, 7, 8),
            DialectKind::Postgres => ServerVersion::new(9, 4, 0),
        }
    }
}

/// A `major.minor.patch` server version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ServerVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version string as reported by a server.
    ///
    /// Accepts trailing decorations such as `8.0.21-log`, `10.6.12-MariaDB` or
    /// `14.2 (Debian 14.2-1.pgdg110+1)`. Missing components default to 0.
    pub fn parse(s: &str) -> SqlResult<Self> {
        let head = s
            .trim()
            .split(|c: char| !(c.is_ascii_digit() || c == '.'))
            .next()
            .unwrap_or_default();

        let mut nums = head.split('.').filter(|p| !p.is_empty()).map(str::parse::<u32>);
        let major = match nums.next() {
            Some(Ok(n)) => n,
            _ => return Err(SqlError::shape(format!("cannot parse server version '{s}'"))),
        };
        let minor = nums.next().and_then(Result::ok).unwrap_or(0);
        let patch = nums.next().and_then(Result::ok).unwrap_or(0);
        Ok(Self::new(major, minor, patch))
    }
}

impl PartialOrd for ServerVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ServerVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Dialect capabilities, computed once from the engine kind and server version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialect {
    kind: DialectKind,
    server_version: Option<ServerVersion>,
    identifier_quote: char,
    json_object_fn: &'static str,
    json_array_fn: &'static str,
    json_supported: bool,
}

impl Dialect {
    /// Create a dialect. An unknown server version is assumed to support JSON.
    pub fn new(kind: DialectKind, server_version: Option<ServerVersion>) -> Self {
        let (identifier_quote, json_object_fn, json_array_fn) = match kind {
            DialectKind::MySql => ('`', "json_object", "json_array"),
            DialectKind::Postgres => ('"', "json_build_object", "json_build_array"),
        };
        let json_supported = server_version.is_none_or(|v| v >= kind.json_threshold());
        Self {
            kind,
            server_version,
            identifier_quote,
            json_object_fn,
            json_array_fn,
            json_supported,
        }
    }

    /// MySQL-like dialect.
    pub fn mysql() -> Self {
        Self::new(DialectKind::MySql, None)
    }

    /// PostgreSQL-like dialect.
    pub fn postgres() -> Self {
        Self::new(DialectKind::Postgres, None)
    }

    /// Same dialect, pinned to a server version.
    pub fn with_server_version(self, version: ServerVersion) -> Self {
        Self::new(self.kind, Some(version))
    }

    pub fn kind(&self) -> DialectKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn server_version(&self) -> Option<ServerVersion> {
        self.server_version
    }

    pub fn identifier_quote(&self) -> char {
        self.identifier_quote
    }

    // ==================== Escaping ====================

    /// Escape a value as a literal.
    ///
    /// Lists become a comma-joined literal list (without parentheses),
    /// identifier markers are quoted, raw fragments pass through.
    pub fn escape(&self, value: &Value) -> SqlResult<String> {
        match value {
            Value::List(items) => self.escape_list(items),
            Value::Ident(name) => self.escape_identifier(name),
            Value::Raw(sql) => Ok(sql.clone()),
            scalar => self.escape_scalar(scalar),
        }
    }

    /// Escape an ordered sequence of scalars as `a, b, c`.
    pub fn escape_list(&self, items: &[Value]) -> SqlResult<String> {
        let mut out = String::new();
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&self.escape_scalar(item)?);
        }
        Ok(out)
    }

    fn escape_scalar(&self, value: &Value) -> SqlResult<String> {
        match value {
            Value::Null => Ok("NULL".to_string()),
            Value::Bool(b) => Ok(match (self.kind, b) {
                (DialectKind::MySql, true) => "true",
                (DialectKind::MySql, false) => "false",
                (DialectKind::Postgres, true) => "TRUE",
                (DialectKind::Postgres, false) => "FALSE",
            }
            .to_string()),
            Value::Int(n) => Ok(n.to_string()),
            Value::Float(f) if f.is_finite() => Ok(f.to_string()),
            Value::Float(f) => Err(SqlError::shape(format!("{f} has no SQL literal form"))),
            Value::Text(s) => Ok(self.escape_string(s)),
            other => Err(SqlError::shape(format!(
                "expected a scalar value, got {}",
                other.shape_name()
            ))),
        }
    }

    fn escape_string(&self, s: &str) -> String {
        let mut out = String::with_capacity(s.len() + 2);
        match self.kind {
            DialectKind::MySql => {
                out.push('\'');
                for ch in s.chars() {
                    match ch {
                        '\0' => out.push_str("\\0"),
                        '\u{8}' => out.push_str("\\b"),
                        '\t' => out.push_str("\\t"),
                        '\n' => out.push_str("\\n"),
                        '\r' => out.push_str("\\r"),
                        '\u{1a}' => out.push_str("\\Z"),
                        '"' => out.push_str("\\\""),
                        '\'' => out.push_str("\\'"),
                        '\\' => out.push_str("\\\\"),
                        c => out.push(c),
                    }
                }
                out.push('\'');
            }
            DialectKind::Postgres => {
                if s.contains('\\') {
                    out.push('E');
                }
                out.push('\'');
                for ch in s.chars() {
                    match ch {
                        '\'' => out.push_str("''"),
                        '\\' => out.push_str("\\\\"),
                        c => out.push(c),
                    }
                }
                out.push('\'');
            }
        }
        out
    }

    /// Quote a single (possibly dotted) identifier.
    pub fn escape_identifier(&self, name: &str) -> SqlResult<String> {
        Ok(Ident::parse(name)?.to_sql(self.identifier_quote))
    }

    /// Quote several identifiers, returned separately.
    pub fn escape_identifiers<I, S>(&self, names: I) -> SqlResult<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|n| self.escape_identifier(n.as_ref()))
            .collect()
    }

    /// Quote several identifiers and join them with `, `.
    pub fn escape_identifier_list<I, S>(&self, names: I) -> SqlResult<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(self.escape_identifiers(names)?.join(", "))
    }

    /// Expand a template against parameters. See [`crate::prepare()`].
    pub fn prepare(&self, template: &str, params: &[Value]) -> SqlResult<String> {
        crate::prepare::prepare(self, template, params)
    }

    // ==================== JSON ====================

    /// Whether the server version passes the JSON support gate.
    pub fn supports_json(&self) -> bool {
        self.json_supported
    }

    /// JSON-object and JSON-array constructor names, or an error when the
    /// server is too old.
    pub fn json_functions(&self) -> SqlResult<(&'static str, &'static str)> {
        if !self.json_supported {
            return Err(SqlError::JsonUnsupported {
                dialect: self.name(),
                version: self
                    .server_version
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
                required: self.kind.json_threshold().to_string(),
            });
        }
        Ok((self.json_object_fn, self.json_array_fn))
    }

    // ==================== Dialect-specific clauses ====================

    /// Full-text predicate over already-escaped columns.
    pub fn fulltext(&self, columns: &[String], term: &str) -> SqlResult<String> {
        if columns.is_empty() || term.trim().is_empty() {
            return Err(SqlError::EmptySearchArgument);
        }
        let term = self.escape_string(term.trim());
        Ok(match self.kind {
            DialectKind::MySql => format!("MATCH ({}) AGAINST ({term})", columns.join(", ")),
            DialectKind::Postgres => {
                let document = match columns {
                    [single] => single.clone(),
                    many => format!("concat_ws(' ', {})", many.join(", ")),
                };
                format!("to_tsvector({document}) @@ to_tsquery({term})")
            }
        })
    }

    /// LIMIT clause for a window of `count` rows starting at `offset`.
    pub fn limit(&self, offset: u64, count: u64) -> String {
        match self.kind {
            DialectKind::MySql => format!("LIMIT {offset}, {count}"),
            DialectKind::Postgres => format!("LIMIT {count} OFFSET {offset}"),
        }
    }
}
