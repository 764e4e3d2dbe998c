//! # sqlfluent
//!
//! A fluent, injection-safe SQL statement compiler for MySQL-like and
//! PostgreSQL-like dialects.
//!
//! ## Features
//!
//! - **Escaped at the call site**: every value and identifier is escaped when it is added
//! - **Placeholders**: `?` for literals, `??` for identifiers, `(?)` for literal lists
//! - **JSON projections**: nested specs compile to `json_object` / `json_build_object`
//! - **Predictable grouping**: WHERE/HAVING entries are parenthesized by a fixed rule
//! - **Pretty output**: multi-line rendering, sub-statements indented per level
//! - **Structured view**: a serializable snapshot that renders back to the same text
//!
//! ## Statement builder
//!
//! ```ignore
//! use sqlfluent::prelude::*;
//!
//! let sql = Statement::new(Dialect::mysql())
//!     .table("users AS u")
//!     .select("u.id, u.name")
//!     .left_join("roles AS r", "?? = ??", params!["u.role_id", "r.id"])
//!     .where_("?? > ?", params!["u.old", 50])
//!     .or_where("?? IN (?)", params!["r.name", vec!["admin", "owner"]])
//!     .order_by("u.name", "ASC")
//!     .limit(0, 10)
//!     .to_sql(false)?;
//!
//! // Execution goes through a `Link`.
//! let link = PgLink::connect("postgres://localhost/app").await?;
//! let outcome = Statement::new(link.dialect().clone())
//!     .table("users")
//!     .delete()
//!     .where_("?? = ?", params!["id", 7])
//!     .execute(&link)
//!     .await?;
//! ```

pub mod cache;
pub mod clause;
pub mod config;
pub mod dialect;
pub mod error;
pub mod field;
pub mod ident;
pub mod json;
pub mod link;
pub mod prelude;
pub mod prepare;
pub mod statement;
pub mod value;

pub use cache::{MemoryCache, MetaCache};
pub use clause::{
    Aggregate, BoolOp, ClauseKind, Fragment, JoinKind, Order, Part, StatementKind,
    render_predicates,
};
pub use config::StatementConfig;
pub use dialect::{Dialect, DialectKind, ServerVersion};
pub use error::{SqlError, SqlResult};
pub use field::{Field, Subquery, normalize_field, normalize_field_joined};
pub use ident::{Ident, IdentPart};
pub use json::{JsonKind, JsonSpec, compile_json};
pub use link::{Link, PgLink, QueryOutcome};
pub use prepare::prepare;
pub use statement::{Row, Statement, StatementSnapshot, row};
pub use value::Value;
