//! Fluent statement builder.
//!
//! A [`Statement`] accumulates escaped clause fragments and renders them into
//! a single SQL string for its [`Dialect`].
//!
//! # Example
//! ```ignore
//! use sqlfluent::prelude::*;
//!
//! let sql = Statement::new(Dialect::mysql())
//!     .table("users")
//!     .select("*")
//!     .where_("?? > ?", params!["old", 50])
//!     .limit(0, 10)
//!     .to_sql(false)?;
//! assert_eq!(sql, "SELECT * FROM `users` WHERE (`old` > 50) LIMIT 0, 10");
//! ```
//!
//! Builder methods never fail on their own. The first error is stored on the
//! statement and returned by every terminal call ([`Statement::to_sql`],
//! [`Statement::to_structured`], [`Statement::execute`]).

pub mod render;
mod snapshot;

#[cfg(test)]
mod tests;

pub use snapshot::StatementSnapshot;

use crate::clause::{Aggregate, BoolOp, ClauseKind, Fragment, JoinKind, Order, Part, StatementKind};
use crate::config::StatementConfig;
use crate::dialect::{Dialect, DialectKind};
use crate::error::{SqlError, SqlResult};
use crate::field::{Field, normalize_field, normalize_field_joined, split_top_level};
use crate::json::{JsonKind, JsonSpec, compile_json};
use crate::link::Link;
use crate::value::Value;
use std::collections::HashSet;

/// One row of column/value pairs for [`Statement::insert`] and
/// [`Statement::update`].
pub type Row = Vec<(String, Value)>;

/// Build a [`Row`] from pairs.
pub fn row<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Row
where
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// SQL statement builder.
#[derive(Debug, Clone)]
pub struct Statement {
    dialect: Dialect,
    config: StatementConfig,
    state: StatementSnapshot,
    /// Alias used when this statement is embedded in another one.
    alias: Option<String>,
    /// Escaped INSERT columns, taken from the first row.
    insert_columns: Vec<String>,
    /// Clause the next `or()`/`and()` applies to.
    last_predicate: Option<ClauseKind>,
    build_error: Option<SqlError>,
}

impl Statement {
    /// Create an empty statement.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            config: StatementConfig::default(),
            state: StatementSnapshot::default(),
            alias: None,
            insert_columns: Vec::new(),
            last_predicate: None,
            build_error: None,
        }
    }

    /// Replace the rendering/logging configuration.
    pub fn with_config(mut self, config: StatementConfig) -> Self {
        self.config = config;
        self
    }

    /// Rebuild a statement from its structured view.
    pub fn from_structured(dialect: Dialect, snapshot: StatementSnapshot) -> Self {
        let insert_columns = snapshot
            .clause(ClauseKind::Insert)
            .first()
            .map(|columns| {
                columns
                    .parts
                    .iter()
                    .filter_map(|p| match p {
                        Part::Sql(sql) => Some(sql.as_str()),
                        Part::Sub(_) => None,
                    })
                    .flat_map(|sql| split_top_level(sql, ','))
                    .map(|c| c.trim().to_string())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            insert_columns,
            state: snapshot,
            ..Self::new(dialect)
        }
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn config(&self) -> &StatementConfig {
        &self.config
    }

    /// The active statement kind, if one was chosen.
    pub fn kind(&self) -> Option<StatementKind> {
        self.state.kind
    }

    /// The first build error, if any.
    pub fn error(&self) -> Option<&SqlError> {
        self.build_error.as_ref()
    }

    // ==================== Target ====================

    /// Set the target table (`"users"` or `"users AS u"`).
    pub fn table(self, name: &str) -> Self {
        self.apply(|s| {
            let table = normalize_field_joined(&s.dialect, &Field::from(name))?;
            s.state.table = Some(table.render(false, 0)?);
            Ok(())
        })
    }

    /// Alias used when this statement is embedded as a field, table or join.
    pub fn alias(mut self, name: &str) -> Self {
        self.alias = Some(name.to_string());
        self
    }

    pub fn alias_name(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Explicit FROM source. Replaces the table in SELECT statements.
    pub fn from(self, source: impl Into<Field>) -> Self {
        let source = source.into();
        self.apply(|s| {
            s.switch_kind(StatementKind::Select);
            require_alias(&source, "FROM")?;
            s.push_fields(ClauseKind::From, &source)
        })
    }

    // ==================== Statement kinds ====================

    /// Add fields to the select list.
    pub fn select(self, fields: impl Into<Field>) -> Self {
        let fields = fields.into();
        self.apply(|s| {
            s.switch_kind(StatementKind::Select);
            require_alias(&fields, "the select list")?;
            s.push_fields(ClauseKind::Select, &fields)
        })
    }

    /// Select a JSON object or array built from columns.
    ///
    /// An empty spec adds nothing. An empty `alias` leaves the expression
    /// unaliased.
    pub fn select_json(self, spec: impl Into<JsonSpec>, kind: JsonKind, alias: &str) -> Self {
        let spec = spec.into();
        self.apply(|s| {
            s.switch_kind(StatementKind::Select);
            let expr = compile_json(&s.dialect, &spec, kind)?;
            if expr.is_empty() {
                return Ok(());
            }
            let fragment = if alias.trim().is_empty() {
                Fragment::sql(expr)
            } else {
                Fragment::sql(format!("{expr} AS {}", s.dialect.escape_identifier(alias)?))
            };
            s.state.push(ClauseKind::Select, fragment);
            Ok(())
        })
    }

    /// Add an aggregate (`count`, `sum`, `avg`, `min`, `max`) to the select list.
    pub fn aggregate(self, function: &str, field: impl Into<Field>, alias: Option<&str>) -> Self {
        let field = field.into();
        self.apply(|s| {
            s.switch_kind(StatementKind::Select);
            let function = Aggregate::parse(function)?;
            let mut items = normalize_field(&s.dialect, &field)?;
            if items.len() != 1 {
                return Err(SqlError::shape(format!(
                    "{}() takes exactly one field, got {}",
                    function.function(),
                    items.len()
                )));
            }
            let mut fragment = items
                .remove(0)
                .prefixed(format!("{}(", function.function()))
                .suffixed(")");
            if let Some(alias) = alias {
                fragment = fragment.suffixed(format!(" AS {}", s.dialect.escape_identifier(alias)?));
            }
            s.state.push(ClauseKind::Aggregate, fragment);
            Ok(())
        })
    }

    /// Insert rows. Columns come from the first row; later rows are matched
    /// by column name.
    pub fn insert(self, rows: impl IntoIterator<Item = Row>) -> Self {
        let rows: Vec<Row> = rows.into_iter().collect();
        self.apply(|s| {
            s.switch_kind(StatementKind::Insert);
            if rows.is_empty() {
                return Err(SqlError::shape("insert() requires at least one row"));
            }
            rows.iter().try_for_each(|row| s.push_insert_row(row))
        })
    }

    /// Set columns of an UPDATE.
    pub fn update(self, row: Row) -> Self {
        self.apply(|s| {
            s.switch_kind(StatementKind::Update);
            if row.is_empty() {
                return Err(SqlError::shape("update() requires at least one column"));
            }
            for (column, value) in s.escape_row(&row)? {
                s.state
                    .push(ClauseKind::Update, Fragment::sql(format!("{column} = {value}")));
            }
            s.check_limit_support()
        })
    }

    /// Turn this into a DELETE.
    pub fn delete(self) -> Self {
        self.apply(|s| {
            s.switch_kind(StatementKind::Delete);
            s.check_limit_support()
        })
    }

    // ==================== Joins ====================

    /// Join `table` on a placeholder template. An empty template omits `ON`.
    pub fn join(
        self,
        kind: JoinKind,
        table: impl Into<Field>,
        on: &str,
        params: Vec<Value>,
    ) -> Self {
        let table = table.into();
        self.apply(|s| {
            require_alias(&table, "JOIN")?;
            let mut fragment = normalize_field_joined(&s.dialect, &table)?
                .prefixed(format!("{} ", kind.keyword()));
            if !on.trim().is_empty() {
                fragment = fragment.suffixed(format!(" ON {}", s.dialect.prepare(on, &params)?));
            }
            s.state.push(ClauseKind::Join, fragment);
            Ok(())
        })
    }

    pub fn inner_join(self, table: impl Into<Field>, on: &str, params: Vec<Value>) -> Self {
        self.join(JoinKind::Inner, table, on, params)
    }

    pub fn left_join(self, table: impl Into<Field>, on: &str, params: Vec<Value>) -> Self {
        self.join(JoinKind::Left, table, on, params)
    }

    pub fn right_join(self, table: impl Into<Field>, on: &str, params: Vec<Value>) -> Self {
        self.join(JoinKind::Right, table, on, params)
    }

    // ==================== WHERE ====================

    /// Add a WHERE predicate joined to the next one with AND.
    pub fn where_(self, template: &str, params: Vec<Value>) -> Self {
        self.where_with(template, params, "AND")
    }

    /// Add a WHERE predicate joined to the next one with `op` (`AND`/`OR`).
    pub fn where_with(self, template: &str, params: Vec<Value>, op: &str) -> Self {
        self.apply(|s| {
            let op = BoolOp::parse(op)?;
            s.push_template_predicate(ClauseKind::Where, template, &params, op)
        })
    }

    /// `previous OR this`.
    pub fn or_where(self, template: &str, params: Vec<Value>) -> Self {
        self.set_last_op(ClauseKind::Where, BoolOp::Or)
            .where_(template, params)
    }

    /// `previous AND this`.
    pub fn and_where(self, template: &str, params: Vec<Value>) -> Self {
        self.set_last_op(ClauseKind::Where, BoolOp::And)
            .where_(template, params)
    }

    /// Join the most recent WHERE/HAVING predicate to the next one with OR.
    pub fn or(self) -> Self {
        let clause = self.last_predicate.unwrap_or(ClauseKind::Where);
        self.set_last_op(clause, BoolOp::Or)
    }

    /// Join the most recent WHERE/HAVING predicate to the next one with AND.
    pub fn and(self) -> Self {
        let clause = self.last_predicate.unwrap_or(ClauseKind::Where);
        self.set_last_op(clause, BoolOp::And)
    }

    /// `field IN (values...)`. An empty list matches nothing.
    pub fn where_in(self, field: &str, values: impl Into<Value>) -> Self {
        let values = values.into();
        self.apply(|s| {
            let expr = s
                .dialect
                .prepare("?? IN (?)", &[Value::Text(field.to_string()), values])?;
            s.push_predicate(ClauseKind::Where, Fragment::sql(expr), BoolOp::And);
            Ok(())
        })
    }

    /// `field IN (<sub-statement>)`.
    pub fn where_in_sub(self, field: &str, statement: Statement) -> Self {
        self.apply(|s| {
            let fragment = Fragment::from_parts(vec![
                Part::Sql(format!("{} IN ", s.dialect.escape_identifier(field)?)),
                Part::Sub(Box::new(statement.nested_snapshot(&s.dialect)?)),
            ]);
            s.push_predicate(ClauseKind::Where, fragment, BoolOp::And);
            Ok(())
        })
    }

    /// Full-text search over `fields`.
    pub fn search(self, fields: impl Into<Field>, term: &str) -> Self {
        let fields = fields.into();
        self.apply(|s| {
            let blank = match &fields {
                Field::Text(text) => text.trim().is_empty(),
                Field::List(names) => names.is_empty(),
                _ => false,
            };
            if blank {
                return Err(SqlError::EmptySearchArgument);
            }
            let mut columns = Vec::new();
            for fragment in normalize_field(&s.dialect, &fields)? {
                if fragment.has_sub() {
                    return Err(SqlError::shape("search() fields must be column names"));
                }
                columns.push(fragment.render(false, 0)?);
            }
            let expr = s.dialect.fulltext(&columns, term)?;
            s.push_predicate(ClauseKind::Where, Fragment::sql(expr), BoolOp::And);
            Ok(())
        })
    }

    // ==================== GROUP BY / HAVING ====================

    pub fn group_by(self, fields: impl Into<Field>) -> Self {
        let fields = fields.into();
        self.apply(|s| s.push_fields(ClauseKind::GroupBy, &fields))
    }

    /// Add a HAVING predicate joined to the next one with AND.
    pub fn having(self, template: &str, params: Vec<Value>) -> Self {
        self.having_with(template, params, "AND")
    }

    /// Add a HAVING predicate joined to the next one with `op` (`AND`/`OR`).
    pub fn having_with(self, template: &str, params: Vec<Value>, op: &str) -> Self {
        self.apply(|s| {
            let op = BoolOp::parse(op)?;
            s.push_template_predicate(ClauseKind::Having, template, &params, op)
        })
    }

    /// `previous OR this` in HAVING.
    pub fn or_having(self, template: &str, params: Vec<Value>) -> Self {
        self.set_last_op(ClauseKind::Having, BoolOp::Or)
            .having(template, params)
    }

    // ==================== ORDER BY / LIMIT ====================

    /// Order by `fields` in `direction` (`ASC`/`DESC`).
    pub fn order_by(self, fields: impl Into<Field>, direction: &str) -> Self {
        let fields = fields.into();
        self.apply(|s| {
            let order = Order::parse(direction)?;
            for fragment in normalize_field(&s.dialect, &fields)? {
                s.state
                    .push(ClauseKind::OrderBy, fragment.suffixed(format!(" {}", order.keyword())));
            }
            Ok(())
        })
    }

    /// Window of `count` rows starting at `offset`. Replaces any previous limit.
    pub fn limit(self, offset: u64, count: u64) -> Self {
        self.apply(|s| {
            s.state
                .replace(ClauseKind::Limit, Fragment::sql(s.dialect.limit(offset, count)));
            s.check_limit_support()
        })
    }

    /// Append an already-escaped fragment to a clause.
    ///
    /// # Safety
    /// The fragment is rendered verbatim; escape its contents first.
    pub fn push_clause(mut self, kind: ClauseKind, fragment: Fragment) -> Self {
        match kind {
            ClauseKind::Where | ClauseKind::Having => {
                let op = fragment.op.unwrap_or_default();
                self.push_predicate(kind, fragment, op);
            }
            _ => self.state.push(kind, fragment),
        }
        self
    }

    // ==================== Lifecycle ====================

    /// Clear the kind, all clauses and any build error. The table, alias and
    /// configuration are kept.
    pub fn reset(mut self) -> Self {
        self.state.kind = None;
        self.state.clauses.clear();
        self.insert_columns.clear();
        self.last_predicate = None;
        self.build_error = None;
        self
    }

    /// Render the statement.
    pub fn to_sql(&self, pretty: bool) -> SqlResult<String> {
        self.validate()?;
        render::render(&self.state, pretty)
    }

    /// Render using the configured `pretty` flag.
    pub fn sql(&self) -> SqlResult<String> {
        self.to_sql(self.config.pretty)
    }

    /// Structured view of the accumulated state.
    pub fn to_structured(&self) -> SqlResult<StatementSnapshot> {
        self.validate()?;
        Ok(self.state.clone())
    }

    /// Structured view marked for embedding in another statement.
    /// Fails when `parent` quotes for a different dialect.
    pub(crate) fn nested_snapshot(&self, parent: &Dialect) -> SqlResult<StatementSnapshot> {
        if parent.kind() != self.dialect.kind() {
            return Err(SqlError::Config(format!(
                "a {} sub-statement cannot be nested in a {} statement",
                self.dialect.name(),
                parent.name()
            )));
        }
        let mut snapshot = self.to_structured()?;
        snapshot.is_sub = true;
        Ok(snapshot)
    }

    /// Render and run the statement through `link`.
    pub async fn execute<L: Link>(&self, link: &L) -> SqlResult<L::Rows> {
        let sql = match self.sql() {
            Ok(sql) => sql,
            Err(err) => {
                tracing::warn!(target: "sqlfluent.sql", error = %err, "statement rejected before execution");
                return Err(err);
            }
        };
        if link.dialect().kind() != self.dialect.kind() {
            return Err(SqlError::Config(format!(
                "statement built for {} cannot run on a {} link",
                self.dialect.name(),
                link.dialect().name()
            )));
        }

        if self.config.log_sql {
            let kind = self.state.kind.unwrap_or(StatementKind::Select);
            tracing::debug!(
                target: "sqlfluent.sql",
                kind = %kind,
                dialect = self.dialect.name(),
                sql = %self.config.truncate_for_log(&sql),
                "executing statement"
            );
        }
        link.execute(&sql).await
    }

    // ==================== Internals ====================

    fn apply(mut self, f: impl FnOnce(&mut Self) -> SqlResult<()>) -> Self {
        if self.build_error.is_none() {
            if let Err(err) = f(&mut self) {
                self.build_error = Some(err);
            }
        }
        self
    }

    fn validate(&self) -> SqlResult<()> {
        match &self.build_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Choosing a different kind starts a new session.
    fn switch_kind(&mut self, kind: StatementKind) {
        if self.state.kind.is_some_and(|k| k != kind) {
            self.state.clauses.clear();
            self.insert_columns.clear();
            self.last_predicate = None;
        }
        self.state.kind = Some(kind);
    }

    fn push_fields(&mut self, clause: ClauseKind, field: &Field) -> SqlResult<()> {
        for fragment in normalize_field(&self.dialect, field)? {
            self.state.push(clause, fragment);
        }
        Ok(())
    }

    fn push_template_predicate(
        &mut self,
        clause: ClauseKind,
        template: &str,
        params: &[Value],
        op: BoolOp,
    ) -> SqlResult<()> {
        if template.trim().is_empty() {
            return Err(SqlError::shape("predicate template cannot be empty"));
        }
        let expr = self.dialect.prepare(template, params)?;
        self.push_predicate(clause, Fragment::sql(expr), op);
        Ok(())
    }

    fn push_predicate(&mut self, clause: ClauseKind, fragment: Fragment, op: BoolOp) {
        self.state.push(clause, fragment.with_op(op));
        self.last_predicate = Some(clause);
    }

    fn set_last_op(mut self, clause: ClauseKind, op: BoolOp) -> Self {
        if let Some(last) = self.state.last_mut(clause) {
            last.op = Some(op);
        }
        self
    }

    fn escape_column_value(&self, column: &str, value: &Value) -> SqlResult<String> {
        if matches!(value, Value::List(_)) {
            return Err(SqlError::shape(format!(
                "column '{column}' cannot take a list value"
            )));
        }
        self.dialect.escape(value)
    }

    /// Escape a row into `(column, value)` pairs. A column may appear once.
    fn escape_row(&self, row: &Row) -> SqlResult<Vec<(String, String)>> {
        let mut seen = HashSet::with_capacity(row.len());
        let mut escaped = Vec::with_capacity(row.len());
        for (column, value) in row {
            let name = self.dialect.escape_identifier(column)?;
            if !seen.insert(name.clone()) {
                return Err(SqlError::shape(format!("column {name} appears twice in one row")));
            }
            escaped.push((name, self.escape_column_value(column, value)?));
        }
        Ok(escaped)
    }

    /// PostgreSQL has no LIMIT on UPDATE or DELETE.
    fn check_limit_support(&self) -> SqlResult<()> {
        let limited = !self.state.clause(ClauseKind::Limit).is_empty();
        let modifying = matches!(
            self.state.kind,
            Some(StatementKind::Update | StatementKind::Delete)
        );
        if limited && modifying && self.dialect.kind() == DialectKind::Postgres {
            return Err(SqlError::shape(
                "PostgreSQL does not accept LIMIT on UPDATE or DELETE",
            ));
        }
        Ok(())
    }

    fn push_insert_row(&mut self, row: &Row) -> SqlResult<()> {
        if row.is_empty() {
            return Err(SqlError::shape("insert() rows cannot be empty"));
        }
        let escaped = self.escape_row(row)?;

        if self.insert_columns.is_empty() {
            self.insert_columns = escaped.iter().map(|(c, _)| c.clone()).collect();
            self.state
                .push(ClauseKind::Insert, Fragment::sql(self.insert_columns.join(", ")));
        }
        if escaped.len() != self.insert_columns.len() {
            return Err(SqlError::shape(format!(
                "row has {} columns but the first row has {}",
                escaped.len(),
                self.insert_columns.len()
            )));
        }

        if let Some((column, _)) = escaped
            .iter()
            .find(|(c, _)| !self.insert_columns.contains(c))
        {
            return Err(SqlError::shape(format!(
                "row has column {column} which the first row does not"
            )));
        }

        let mut values = Vec::with_capacity(escaped.len());
        for column in &self.insert_columns {
            let value = escaped
                .iter()
                .find(|(c, _)| c == column)
                .map(|(_, v)| v.as_str())
                .ok_or_else(|| SqlError::shape(format!("row has no value for column {column}")))?;
            values.push(value);
        }
        self.state
            .push(ClauseKind::Insert, Fragment::sql(values.join(", ")));
        Ok(())
    }
}

fn require_alias(field: &Field, context: &str) -> SqlResult<()> {
    if field.is_unaliased_statement() {
        return Err(SqlError::missing_alias(format!(
            "a sub-statement used in {context} needs an alias; call .alias(..) on it"
        )));
    }
    Ok(())
}
