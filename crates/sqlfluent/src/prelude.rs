//! Convenient imports for typical `sqlfluent` usage.
//!
//! ```ignore
//! use sqlfluent::prelude::*;
//! ```

pub use crate::params;
pub use crate::{
    Dialect, Field, JoinKind, JsonKind, JsonSpec, Link, PgLink, Row, SqlError, SqlResult,
    Statement, StatementConfig, Value, row,
};
