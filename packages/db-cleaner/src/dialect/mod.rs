//! Per-dialect truncation strategies.
//!
//! Every supported database gets a stateless adapter implementing
//! [`TruncationAdapter`]. The orchestrator in [`crate::truncation`] picks one
//! from the connection's declared backend and never issues dialect SQL itself.

use std::fmt;

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseBackend, DbErr};

use crate::error::CleanerError;

pub mod mysql;
pub mod postgres;
pub mod sqlite;

pub use mysql::MySqlAdapter;
pub use postgres::PostgresAdapter;
pub use sqlite::SqliteAdapter;

/// SQL dialect of the connection being cleaned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    MySql,
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Infer the dialect from a connection URL scheme.
    pub fn from_url(url: &str) -> Result<Self, CleanerError> {
        let scheme = url.split(':').next().unwrap_or_default().to_ascii_lowercase();
        match scheme.as_str() {
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "sqlite" => Ok(Dialect::Sqlite),
            _ => Err(CleanerError::config(format!(
                "unsupported database URL scheme '{scheme}' (expected mysql, postgres or sqlite)"
            ))),
        }
    }

    /// Quote a (possibly schema-qualified) identifier for this dialect.
    ///
    /// Each dot-separated part is quoted on its own; embedded quote characters
    /// are doubled.
    pub fn quote_name(self, name: &str) -> String {
        let quote = match self {
            Dialect::MySql => '`',
            Dialect::Postgres | Dialect::Sqlite => '"',
        };
        let doubled = format!("{quote}{quote}");
        name.split('.')
            .map(|part| format!("{quote}{}{quote}", part.replace(quote, &doubled)))
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl From<DatabaseBackend> for Dialect {
    fn from(backend: DatabaseBackend) -> Self {
        match backend {
            DatabaseBackend::MySql => Dialect::MySql,
            DatabaseBackend::Postgres => Dialect::Postgres,
            DatabaseBackend::Sqlite => Dialect::Sqlite,
        }
    }
}

impl From<Dialect> for DatabaseBackend {
    fn from(dialect: Dialect) -> Self {
        match dialect {
            Dialect::MySql => DatabaseBackend::MySql,
            Dialect::Postgres => DatabaseBackend::Postgres,
            Dialect::Sqlite => DatabaseBackend::Sqlite,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgresql",
            Dialect::Sqlite => "sqlite",
        };
        f.write_str(name)
    }
}

/// Dialect-specific table discovery, truncation and foreign key toggling.
///
/// Adapters hold no state; anything that has to survive between disabling and
/// restoring referential integrity travels in [`TruncationAdapter::Saved`].
#[async_trait]
pub trait TruncationAdapter: Send + Sync {
    /// Whatever must be remembered to put integrity enforcement back.
    type Saved: Send;

    fn dialect(&self) -> Dialect;

    /// All application tables in the active schema.
    async fn storage_names<C>(&self, conn: &C) -> Result<Vec<String>, DbErr>
    where
        C: ConnectionTrait;

    /// Remove every row of `table`, resetting its identity counter when `reset_ids` is set.
    async fn truncate_table<C>(&self, conn: &C, table: &str, reset_ids: bool) -> Result<(), DbErr>
    where
        C: ConnectionTrait;

    async fn truncate_tables<C>(
        &self,
        conn: &C,
        tables: &[String],
        reset_ids: bool,
    ) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        for table in tables {
            self.truncate_table(conn, table, reset_ids).await?;
        }
        Ok(())
    }

    /// Whether [`TruncationAdapter::pre_count_truncate_tables`] actually filters.
    fn supports_pre_count(&self) -> bool {
        false
    }

    /// Truncate only the tables that look dirty. Dialects without a cheap
    /// dirtiness check truncate everything.
    async fn pre_count_truncate_tables<C>(
        &self,
        conn: &C,
        tables: &[String],
        reset_ids: bool,
    ) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        self.truncate_tables(conn, tables, reset_ids).await
    }

    async fn disable_referential_integrity<C>(&self, conn: &C) -> Result<Self::Saved, DbErr>
    where
        C: ConnectionTrait;

    async fn restore_referential_integrity<C>(
        &self,
        conn: &C,
        saved: Self::Saved,
    ) -> Result<(), DbErr>
    where
        C: ConnectionTrait;
}
