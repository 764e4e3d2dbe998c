//! Structured, serializable view of a statement.

use crate::clause::{ClauseKind, Fragment, StatementKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything needed to render a statement, with every fragment already
/// escaped. Produced by [`crate::Statement::to_structured`] and accepted by
/// [`crate::Statement::from_structured`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementSnapshot {
    #[serde(default)]
    pub kind: Option<StatementKind>,
    /// Escaped table identifier.
    #[serde(default)]
    pub table: Option<String>,
    /// Rendered as a parenthesized sub-expression of another statement.
    #[serde(default)]
    pub is_sub: bool,
    #[serde(default)]
    pub clauses: BTreeMap<ClauseKind, Vec<Fragment>>,
}

impl StatementSnapshot {
    /// Fragments of one clause, in insertion order.
    pub fn clause(&self, kind: ClauseKind) -> &[Fragment] {
        self.clauses.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    pub(crate) fn push(&mut self, kind: ClauseKind, fragment: Fragment) {
        self.clauses.entry(kind).or_default().push(fragment);
    }

    pub(crate) fn last_mut(&mut self, kind: ClauseKind) -> Option<&mut Fragment> {
        self.clauses.get_mut(&kind).and_then(|f| f.last_mut())
    }

    pub(crate) fn replace(&mut self, kind: ClauseKind, fragment: Fragment) {
        self.clauses.insert(kind, vec![fragment]);
    }
}
