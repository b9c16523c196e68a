use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseBackend, DbErr, Statement};
use tracing::debug;

use super::{Dialect, TruncationAdapter};

pub(crate) const STORAGE_NAMES_SQL: &str = "SELECT name FROM sqlite_master \
     WHERE type = 'table' AND NOT name = 'sqlite_sequence'";
pub(crate) const USES_SEQUENCE_SQL: &str =
    "SELECT name FROM sqlite_master WHERE type='table' AND name='sqlite_sequence'";
pub(crate) const SCRUB_SEQUENCE_SQL: &str = "DELETE FROM sqlite_sequence where name = ?";

const FOREIGN_KEYS: &str = "foreign_keys";
const DEFER_FOREIGN_KEYS: &str = "defer_foreign_keys";

pub(crate) fn delete_sql(table: &str) -> String {
    format!("DELETE FROM {};", Dialect::Sqlite.quote_name(table))
}

pub(crate) fn set_pragma_sql(pragma: &str, on: bool) -> String {
    format!("PRAGMA {pragma} = {}", if on { "ON" } else { "OFF" })
}

/// How foreign key enforcement was suspended, so it can be put back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqliteIntegrity {
    /// `foreign_keys` was already off; nothing to undo.
    Unenforced,
    /// `foreign_keys` was switched off for the session.
    Disabled,
    /// Inside a transaction `foreign_keys` cannot change, so checks were
    /// deferred to commit instead. Holds the previous `defer_foreign_keys`.
    Deferred { previous: bool },
}

/// SQLite strategy.
///
/// SQLite has no `TRUNCATE`; rows are deleted and the AUTOINCREMENT
/// bookkeeping in `sqlite_sequence` is removed by hand. That table only
/// exists once some table declared with AUTOINCREMENT has been created.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteAdapter;

impl SqliteAdapter {
    async fn pragma_flag<C>(&self, conn: &C, pragma: &str) -> Result<bool, DbErr>
    where
        C: ConnectionTrait,
    {
        let row = conn
            .query_one(Statement::from_string(
                DatabaseBackend::Sqlite,
                format!("PRAGMA {pragma}"),
            ))
            .await?;
        match row {
            Some(row) => Ok(row.try_get_by_index::<i64>(0)? != 0),
            None => Ok(false),
        }
    }

    async fn set_pragma<C>(&self, conn: &C, pragma: &str, on: bool) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        conn.execute_unprepared(&set_pragma_sql(pragma, on)).await?;
        Ok(())
    }

    async fn uses_sequence<C>(&self, conn: &C) -> Result<bool, DbErr>
    where
        C: ConnectionTrait,
    {
        let row = conn
            .query_one(Statement::from_string(
                DatabaseBackend::Sqlite,
                USES_SEQUENCE_SQL,
            ))
            .await?;
        Ok(row.is_some())
    }

    async fn delete_rows<C>(
        &self,
        conn: &C,
        table: &str,
        scrub_sequence: bool,
    ) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            delete_sql(table),
        ))
        .await?;

        if scrub_sequence {
            conn.execute(Statement::from_sql_and_values(
                DatabaseBackend::Sqlite,
                SCRUB_SEQUENCE_SQL,
                [table.into()],
            ))
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl TruncationAdapter for SqliteAdapter {
    type Saved = SqliteIntegrity;

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn storage_names<C>(&self, conn: &C) -> Result<Vec<String>, DbErr>
    where
        C: ConnectionTrait,
    {
        let rows = conn
            .query_all(Statement::from_string(
                DatabaseBackend::Sqlite,
                STORAGE_NAMES_SQL,
            ))
            .await?;
        rows.iter()
            .map(|row| row.try_get::<String>("", "name"))
            .collect()
    }

    async fn truncate_table<C>(&self, conn: &C, table: &str, reset_ids: bool) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        let scrub = reset_ids && self.uses_sequence(conn).await?;
        self.delete_rows(conn, table, scrub).await
    }

    async fn truncate_tables<C>(
        &self,
        conn: &C,
        tables: &[String],
        reset_ids: bool,
    ) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        if tables.is_empty() {
            return Ok(());
        }
        // sqlite_sequence cannot appear mid-run; DELETE never creates it.
        let scrub = reset_ids && self.uses_sequence(conn).await?;
        debug!(tables = tables.len(), scrub_sequence = scrub, "sqlite delete");
        for table in tables {
            self.delete_rows(conn, table, scrub).await?;
        }
        Ok(())
    }

    async fn disable_referential_integrity<C>(&self, conn: &C) -> Result<Self::Saved, DbErr>
    where
        C: ConnectionTrait,
    {
        if !self.pragma_flag(conn, FOREIGN_KEYS).await? {
            return Ok(SqliteIntegrity::Unenforced);
        }

        self.set_pragma(conn, FOREIGN_KEYS, false).await?;
        if !self.pragma_flag(conn, FOREIGN_KEYS).await? {
            return Ok(SqliteIntegrity::Disabled);
        }

        // Still on: `PRAGMA foreign_keys` is ignored inside a transaction.
        let previous = self.pragma_flag(conn, DEFER_FOREIGN_KEYS).await?;
        self.set_pragma(conn, DEFER_FOREIGN_KEYS, true).await?;
        debug!("sqlite foreign keys deferred to commit");
        Ok(SqliteIntegrity::Deferred { previous })
    }

    async fn restore_referential_integrity<C>(
        &self,
        conn: &C,
        saved: Self::Saved,
    ) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        match saved {
            SqliteIntegrity::Unenforced => Ok(()),
            SqliteIntegrity::Disabled => self.set_pragma(conn, FOREIGN_KEYS, true).await,
            SqliteIntegrity::Deferred { previous } => {
                self.set_pragma(conn, DEFER_FOREIGN_KEYS, previous).await
            }
        }
    }
}
