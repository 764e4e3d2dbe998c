//! Statement assembly.
//!
//! Works on a [`StatementSnapshot`] only; every fragment is escaped already,
//! so no dialect is needed here.

use super::snapshot::StatementSnapshot;
use crate::clause::{ClauseKind, Fragment, StatementKind, render_list, render_predicates};
use crate::error::{SqlError, SqlResult};

/// Render a top-level statement.
pub fn render(snapshot: &StatementSnapshot, pretty: bool) -> SqlResult<String> {
    render_nested(snapshot, pretty, 0)
}

/// Render a statement nested `depth` levels deep.
///
/// In pretty mode a sub-statement starts on its own line and ends with the
/// parent's indentation, so the parent can wrap it in parentheses.
pub(crate) fn render_nested(
    snapshot: &StatementSnapshot,
    pretty: bool,
    depth: usize,
) -> SqlResult<String> {
    let lines = match snapshot.kind.unwrap_or(StatementKind::Select) {
        StatementKind::Select => select_lines(snapshot, pretty, depth)?,
        StatementKind::Insert => insert_lines(snapshot, pretty, depth)?,
        StatementKind::Update => update_lines(snapshot, pretty, depth)?,
        StatementKind::Delete => delete_lines(snapshot, pretty, depth)?,
    };

    if !pretty {
        return Ok(lines.join(" "));
    }
    let indent = "\t".repeat(depth);
    let body = lines.join(&format!("\n{indent}"));
    if snapshot.is_sub && depth > 0 {
        let outer = "\t".repeat(depth - 1);
        Ok(format!("\n{indent}{body}\n{outer}"))
    } else {
        Ok(body)
    }
}

fn table(snapshot: &StatementSnapshot) -> SqlResult<&str> {
    snapshot
        .table
        .as_deref()
        .ok_or(SqlError::MissingTable("table()"))
}

fn select_lines(snapshot: &StatementSnapshot, pretty: bool, depth: usize) -> SqlResult<Vec<String>> {
    let fields = snapshot.clause(ClauseKind::Select);
    let aggregates = snapshot.clause(ClauseKind::Aggregate);
    let mut columns = Vec::new();
    if !fields.is_empty() {
        columns.push(render_list(fields, ", ", pretty, depth)?);
    }
    if !aggregates.is_empty() {
        columns.push(render_list(aggregates, ", ", pretty, depth)?);
    }
    if columns.is_empty() {
        columns.push("*".to_string());
    }

    let from = snapshot.clause(ClauseKind::From);
    let source = if from.is_empty() {
        table(snapshot)?.to_string()
    } else {
        render_list(from, ", ", pretty, depth)?
    };

    let mut lines = vec![
        format!("SELECT {}", columns.join(", ")),
        format!("FROM {source}"),
    ];
    for join in snapshot.clause(ClauseKind::Join) {
        lines.push(join.render(pretty, depth)?);
    }
    push_predicates(&mut lines, "WHERE", snapshot.clause(ClauseKind::Where), pretty, depth)?;
    push_list(&mut lines, "GROUP BY", snapshot.clause(ClauseKind::GroupBy), pretty, depth)?;
    push_predicates(&mut lines, "HAVING", snapshot.clause(ClauseKind::Having), pretty, depth)?;
    push_tail(&mut lines, snapshot, pretty, depth)?;
    Ok(lines)
}

fn insert_lines(snapshot: &StatementSnapshot, pretty: bool, depth: usize) -> SqlResult<Vec<String>> {
    let table = table(snapshot)?;
    if let Some((kind, _)) = snapshot
        .clauses
        .iter()
        .find(|(kind, fragments)| **kind != ClauseKind::Insert && !fragments.is_empty())
    {
        return Err(SqlError::shape(format!("INSERT does not take a {kind:?} clause")));
    }
    let Some((columns, rows)) = snapshot.clause(ClauseKind::Insert).split_first() else {
        return Err(SqlError::shape("INSERT requires at least one row"));
    };
    if rows.is_empty() {
        return Err(SqlError::shape("INSERT requires at least one row"));
    }

    let mut values = Vec::with_capacity(rows.len());
    for row in rows {
        values.push(format!("({})", row.render(pretty, depth)?));
    }
    Ok(vec![
        format!("INSERT INTO {table} ({})", columns.render(pretty, depth)?),
        format!("VALUES {}", values.join(", ")),
    ])
}

fn update_lines(snapshot: &StatementSnapshot, pretty: bool, depth: usize) -> SqlResult<Vec<String>> {
    let table = table(snapshot)?;
    let assignments = snapshot.clause(ClauseKind::Update);
    if assignments.is_empty() {
        return Err(SqlError::shape("UPDATE requires at least one assignment"));
    }

    let mut lines = vec![
        format!("UPDATE {table}"),
        format!("SET {}", render_list(assignments, ", ", pretty, depth)?),
    ];
    push_predicates(&mut lines, "WHERE", snapshot.clause(ClauseKind::Where), pretty, depth)?;
    push_tail(&mut lines, snapshot, pretty, depth)?;
    Ok(lines)
}

fn delete_lines(snapshot: &StatementSnapshot, pretty: bool, depth: usize) -> SqlResult<Vec<String>> {
    let mut lines = vec![format!("DELETE FROM {}", table(snapshot)?)];
    push_predicates(&mut lines, "WHERE", snapshot.clause(ClauseKind::Where), pretty, depth)?;
    push_tail(&mut lines, snapshot, pretty, depth)?;
    Ok(lines)
}

/// ORDER BY and LIMIT, shared by SELECT, UPDATE and DELETE.
fn push_tail(
    lines: &mut Vec<String>,
    snapshot: &StatementSnapshot,
    pretty: bool,
    depth: usize,
) -> SqlResult<()> {
    push_list(lines, "ORDER BY", snapshot.clause(ClauseKind::OrderBy), pretty, depth)?;
    for limit in snapshot.clause(ClauseKind::Limit) {
        lines.push(limit.render(pretty, depth)?);
    }
    Ok(())
}

fn push_list(
    lines: &mut Vec<String>,
    keyword: &str,
    fragments: &[Fragment],
    pretty: bool,
    depth: usize,
) -> SqlResult<()> {
    if !fragments.is_empty() {
        lines.push(format!("{keyword} {}", render_list(fragments, ", ", pretty, depth)?));
    }
    Ok(())
}

fn push_predicates(
    lines: &mut Vec<String>,
    keyword: &str,
    entries: &[Fragment],
    pretty: bool,
    depth: usize,
) -> SqlResult<()> {
    if let Some(rendered) = render_predicates(entries, pretty, depth)? {
        lines.push(format!("{keyword} {rendered}"));
    }
    Ok(())
}
