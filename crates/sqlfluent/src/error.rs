//! Error types for sqlfluent

use thiserror::Error;

/// Result type alias for sqlfluent operations
pub type SqlResult<T> = Result<T, SqlError>;

/// Error types for statement building and execution.
///
/// Everything except [`SqlError::Connection`] and [`SqlError::Execution`] is a
/// build-time configuration error: it is raised before any text is handed to a
/// database and is never worth retrying.
#[derive(Debug, Clone, Error)]
pub enum SqlError {
    /// Rendering was requested before the target table was configured.
    #[error("Missing table: call `{0}` before rendering")]
    MissingTable(&'static str),

    /// A field or parameter has a shape the builder cannot use.
    #[error("Invalid argument shape: {0}")]
    InvalidArgumentShape(String),

    /// Boolean or ordering operator outside the accepted set.
    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    /// A sub-statement was used as a field or table without an alias.
    #[error("Missing alias: {0}")]
    MissingAlias(String),

    /// Aggregate function is not on the allow-list.
    #[error("Unsupported aggregate function '{0}' (expected one of count, sum, avg, min, max)")]
    UnsupportedAggregate(String),

    /// JSON spec cannot be resolved into key/value pairs.
    #[error("Ambiguous JSON spec: {0}")]
    JsonSpecAmbiguous(String),

    /// Server version is below the JSON support threshold of the dialect.
    #[error("JSON functions require {dialect} {required} or newer (server is {version})")]
    JsonUnsupported {
        dialect: &'static str,
        version: String,
        required: String,
    },

    /// Full-text search was requested without columns or without a term.
    #[error("Search requires at least one column and a non-empty term")]
    EmptySearchArgument,

    /// Placeholders in a template could not be resolved against the parameters.
    #[error("Placeholder mismatch: {0}")]
    PlaceholderMismatch(String),

    /// Configuration could not be read or parsed.
    #[error("Config error: {0}")]
    Config(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement execution error reported by the database.
    #[error("Execution error: {0}")]
    Execution(String),
}

impl SqlError {
    /// Create an invalid argument shape error
    pub fn shape(message: impl Into<String>) -> Self {
        Self::InvalidArgumentShape(message.into())
    }

    /// Create an invalid operator error
    pub fn operator(message: impl Into<String>) -> Self {
        Self::InvalidOperator(message.into())
    }

    /// Create a missing alias error
    pub fn missing_alias(message: impl Into<String>) -> Self {
        Self::MissingAlias(message.into())
    }

    /// Create an ambiguous JSON spec error
    pub fn json_ambiguous(message: impl Into<String>) -> Self {
        Self::JsonSpecAmbiguous(message.into())
    }

    /// Check if this error was raised while building a statement (as opposed
    /// to connecting or executing).
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::Connection(_) | Self::Execution(_))
    }

    /// Check if this is a missing table error
    pub fn is_missing_table(&self) -> bool {
        matches!(self, Self::MissingTable(_))
    }
}

impl From<tokio_postgres::Error> for SqlError {
    fn from(err: tokio_postgres::Error) -> Self {
        match err.as_db_error() {
            Some(db_err) => Self::Execution(format!("{}: {}", db_err.code().code(), db_err.message())),
            None => Self::Execution(err.to_string()),
        }
    }
}

impl From<toml::de::Error> for SqlError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
