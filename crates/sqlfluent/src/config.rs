//! Statement rendering and logging configuration.
//!
//! Loaded from TOML, e.g.:
//!
//! ```toml
//! pretty = true
//! log_sql = true
//! max_sql_log_length = 500
//!
//! dialect = "postgres"
//! server_version = "14.2"
//! ```

use crate::dialect::{Dialect, DialectKind, ServerVersion};
use crate::error::{SqlError, SqlResult};
use serde::Deserialize;
use std::path::Path;

/// Configuration shared by statements built from the same source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StatementConfig {
    /// Render multi-line SQL from [`crate::Statement::sql`].
    pub pretty: bool,
    /// Emit a `tracing` event for each executed statement.
    pub log_sql: bool,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    pub max_sql_log_length: Option<usize>,
    /// Dialect to build against when none is given explicitly.
    pub dialect: Option<DialectKind>,
    /// Server version used for the JSON gate, e.g. `"8.0.21"`.
    pub server_version: Option<String>,
}

impl Default for StatementConfig {
    fn default() -> Self {
        Self {
            pretty: false,
            log_sql: true,
            max_sql_log_length: Some(200),
            dialect: None,
            server_version: None,
        }
    }
}

impl StatementConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Render multi-line SQL by default.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Enable or disable SQL logging on execute.
    pub fn log_sql(mut self, enabled: bool) -> Self {
        self.log_sql = enabled;
        self
    }

    /// Set maximum SQL length to log.
    pub fn max_sql_log_length(mut self, len: usize) -> Self {
        self.max_sql_log_length = Some(len);
        self
    }

    /// Disable SQL truncation in logs.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_log_length = None;
        self
    }

    /// Parse a TOML document.
    pub fn from_toml_str(raw: &str) -> SqlResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> SqlResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SqlError::Config(format!("failed to read config {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// The configured dialect, if any.
    pub fn build_dialect(&self) -> SqlResult<Option<Dialect>> {
        let Some(kind) = self.dialect else {
            if self.server_version.is_some() {
                return Err(SqlError::Config(
                    "server_version is set but dialect is missing".to_string(),
                ));
            }
            return Ok(None);
        };
        let version = self
            .server_version
            .as_deref()
            .map(ServerVersion::parse)
            .transpose()
            .map_err(|e| SqlError::Config(e.to_string()))?;
        Ok(Some(Dialect::new(kind, version)))
    }

    /// Truncate `sql` for logging.
    pub(crate) fn truncate_for_log<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.max_sql_log_length {
            Some(max) if sql.len() > max => {
                let mut end = max;
                while end > 0 && !sql.is_char_boundary(end) {
                    end -= 1;
                }
                format!("{}...", &sql[..end]).into()
            }
            _ => sql.into(),
        }
    }
}
