//! Connection capability used by [`crate::Statement::execute`].
//!
//! A [`Link`] knows its [`Dialect`] and runs finished SQL text. The builder
//! never talks to a database any other way.

use crate::cache::MetaCache;
use crate::dialect::{Dialect, DialectKind, ServerVersion};
use crate::error::{SqlError, SqlResult};
use std::time::Duration;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};

/// A database connection that executes rendered SQL.
pub trait Link: Send + Sync {
    /// Result of one execution.
    type Rows: Send;

    /// Dialect of the server on the other end.
    fn dialect(&self) -> &Dialect;

    /// Execute a finished SQL string.
    fn execute(&self, sql: &str) -> impl std::future::Future<Output = SqlResult<Self::Rows>> + Send;
}

/// Rows and affected-row count of a simple-protocol execution. Values are
/// kept in their text form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOutcome {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
    pub affected: u64,
}

impl QueryOutcome {
    fn from_messages(messages: Vec<SimpleQueryMessage>) -> Self {
        let mut outcome = Self::default();
        for message in messages {
            match message {
                SimpleQueryMessage::Row(row) => {
                    if outcome.columns.is_empty() {
                        outcome.columns = row.columns().iter().map(|c| c.name().to_string()).collect();
                    }
                    outcome
                        .rows
                        .push((0..row.len()).map(|i| row.get(i).map(str::to_string)).collect());
                }
                SimpleQueryMessage::CommandComplete(n) => outcome.affected += n,
                _ => {}
            }
        }
        outcome
    }

    /// Value of `column` in row `index`.
    pub fn get(&self, index: usize, column: &str) -> Option<&str> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(index)?.get(col)?.as_deref()
    }
}

/// PostgreSQL [`Link`] over `tokio-postgres`.
pub struct PgLink {
    client: Client,
    dialect: Dialect,
}

impl std::fmt::Debug for PgLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgLink")
            .field("dialect", &self.dialect)
            .finish_non_exhaustive()
    }
}

impl PgLink {
    /// Connect with `NoTls` and detect the server version.
    pub async fn connect(database_url: &str) -> SqlResult<Self> {
        let client = connect_client(database_url).await?;
        let version = query_server_version(&client).await?;
        Ok(Self::from_client(client, Some(version)))
    }

    /// Connect with `NoTls`, reading the server version through `cache`
    /// before asking the server.
    pub async fn connect_cached(
        database_url: &str,
        cache: &impl MetaCache,
        key: &str,
        ttl: Option<Duration>,
    ) -> SqlResult<Self> {
        let client = connect_client(database_url).await?;

        let cached = cache
            .get(key)
            .and_then(|v| v.as_str().and_then(|s| ServerVersion::parse(s).ok()));
        let version = match cached {
            Some(version) => version,
            None => {
                let version = query_server_version(&client).await?;
                cache.set(key, serde_json::Value::String(version.to_string()), ttl);
                version
            }
        };
        Ok(Self::from_client(client, Some(version)))
    }

    /// Wrap an existing client.
    pub fn from_client(client: Client, server_version: Option<ServerVersion>) -> Self {
        Self {
            client,
            dialect: Dialect::new(DialectKind::Postgres, server_version),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl Link for PgLink {
    type Rows = QueryOutcome;

    fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    fn execute(&self, sql: &str) -> impl std::future::Future<Output = SqlResult<QueryOutcome>> + Send {
        async move {
            let messages = self.client.simple_query(sql).await?;
            Ok(QueryOutcome::from_messages(messages))
        }
    }
}

async fn connect_client(database_url: &str) -> SqlResult<Client> {
    let (client, connection) = tokio_postgres::connect(database_url, NoTls)
        .await
        .map_err(|e| SqlError::Connection(e.to_string()))?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!(target: "sqlfluent.sql", error = %e, "connection task failed");
        }
    });
    Ok(client)
}

async fn query_server_version(client: &Client) -> SqlResult<ServerVersion> {
    let messages = client.simple_query("SHOW server_version").await?;
    let outcome = QueryOutcome::from_messages(messages);
    let raw = outcome
        .rows
        .first()
        .and_then(|row| row.first())
        .and_then(|v| v.as_deref())
        .ok_or_else(|| SqlError::Connection("server did not report server_version".to_string()))?;
    let version = ServerVersion::parse(raw)?;
    tracing::debug!(target: "sqlfluent.sql", server_version = %version, "detected server version");
    Ok(version)
}
