//! Clause accumulator primitives and predicate rendering.
//!
//! A statement stores its clauses as ordered [`Fragment`] lists keyed by
//! [`ClauseKind`]. Fragments are escaped when they are pushed, so rendering
//! never needs the dialect again; nested statements are kept as snapshots and
//! rendered in place so pretty output can indent them.

use crate::error::{SqlError, SqlResult};
use crate::statement::StatementSnapshot;
use crate::statement::render::render_nested;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Statement kind. At most one is active per reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl StatementKind {
    pub fn keyword(self) -> &'static str {
        match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Named part of a statement. Iteration order of the clause map follows the
/// declaration order here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseKind {
    Select,
    Aggregate,
    From,
    Join,
    Where,
    GroupBy,
    Having,
    OrderBy,
    Limit,
    Insert,
    Update,
}

/// Boolean operator joining a predicate entry to the *next* entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BoolOp {
    #[default]
    And,
    Or,
}

impl BoolOp {
    /// Parse `AND` / `OR` (case-insensitive).
    pub fn parse(s: &str) -> SqlResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(BoolOp::And),
            "OR" => Ok(BoolOp::Or),
            _ => Err(SqlError::operator(format!(
                "'{s}' is not a boolean operator (expected AND or OR)"
            ))),
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            BoolOp::And => "AND",
            BoolOp::Or => "OR",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    /// Parse `ASC` / `DESC` (case-insensitive).
    pub fn parse(s: &str) -> SqlResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(Order::Asc),
            "DESC" => Ok(Order::Desc),
            _ => Err(SqlError::operator(format!(
                "'{s}' is not a sort direction (expected ASC or DESC)"
            ))),
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

/// Allowed aggregate functions. The list is closed so a function name can
/// never carry arbitrary SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregate {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl Aggregate {
    /// Parse an aggregate name (case-insensitive).
    pub fn parse(s: &str) -> SqlResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count" => Ok(Aggregate::Count),
            "sum" => Ok(Aggregate::Sum),
            "avg" => Ok(Aggregate::Avg),
            "min" => Ok(Aggregate::Min),
            "max" => Ok(Aggregate::Max),
            _ => Err(SqlError::UnsupportedAggregate(s.to_string())),
        }
    }

    pub fn function(self) -> &'static str {
        match self {
            Aggregate::Count => "COUNT",
            Aggregate::Sum => "SUM",
            Aggregate::Avg => "AVG",
            Aggregate::Min => "MIN",
            Aggregate::Max => "MAX",
        }
    }
}

/// Join flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

impl JoinKind {
    pub fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        }
    }
}

/// A piece of a fragment: escaped SQL text or a nested statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Part {
    Sql(String),
    Sub(Box<StatementSnapshot>),
}

/// One entry of a clause.
///
/// `op` is only set on WHERE/HAVING entries and names the operator joining
/// this entry to the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<BoolOp>,
}

impl Fragment {
    /// Fragment made of escaped SQL only.
    pub fn sql(sql: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::Sql(sql.into())],
            op: None,
        }
    }

    /// Fragment from explicit parts.
    pub fn from_parts(parts: Vec<Part>) -> Self {
        Self { parts, op: None }
    }

    /// Turn this fragment into a predicate entry.
    pub fn with_op(mut self, op: BoolOp) -> Self {
        self.op = Some(op);
        self
    }

    /// Prepend escaped SQL.
    pub(crate) fn prefixed(mut self, prefix: impl Into<String>) -> Self {
        self.parts.insert(0, Part::Sql(prefix.into()));
        self
    }

    /// Append escaped SQL.
    pub(crate) fn suffixed(mut self, suffix: impl Into<String>) -> Self {
        self.parts.push(Part::Sql(suffix.into()));
        self
    }

    /// Append another fragment's parts.
    pub(crate) fn extend(&mut self, other: Fragment) {
        self.parts.extend(other.parts);
    }

    /// Whether the fragment embeds a nested statement.
    pub fn has_sub(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, Part::Sub(_)))
    }

    /// Render at the given nesting depth.
    pub fn render(&self, pretty: bool, depth: usize) -> SqlResult<String> {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Sql(s) => out.push_str(s),
                Part::Sub(sub) => {
                    out.push('(');
                    out.push_str(&render_nested(sub, pretty, depth + 1)?);
                    out.push(')');
                }
            }
        }
        Ok(out)
    }
}

/// Render fragments joined by `sep`.
pub(crate) fn render_list(
    fragments: &[Fragment],
    sep: &str,
    pretty: bool,
    depth: usize,
) -> SqlResult<String> {
    let mut out = String::new();
    for (i, fragment) in fragments.iter().enumerate() {
        if i > 0 {
            out.push_str(sep);
        }
        out.push_str(&fragment.render(pretty, depth)?);
    }
    Ok(out)
}

/// Render a WHERE/HAVING entry list.
///
/// Groups open whenever the operator changes and at least two entries remain;
/// all groups close at the end and the whole list is wrapped once. Returns
/// `None` for an empty list.
pub fn render_predicates(
    entries: &[Fragment],
    pretty: bool,
    depth: usize,
) -> SqlResult<Option<String>> {
    if entries.is_empty() {
        return Ok(None);
    }

    let mut out = String::from("(");
    let mut pending = 0usize;
    for (i, entry) in entries.iter().enumerate() {
        out.push_str(&entry.render(pretty, depth)?);

        let Some(next) = entries.get(i + 1) else {
            break;
        };
        let op = entry.op.unwrap_or_default();
        out.push(' ');
        out.push_str(op.keyword());
        out.push(' ');

        if op != next.op.unwrap_or_default() && i + 2 < entries.len() {
            out.push('(');
            pending += 1;
        }
    }
    for _ in 0..pending {
        out.push(')');
    }
    out.push(')');

    Ok(Some(out))
}
