use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseBackend, DbErr, Statement};
use tracing::{debug, trace};

use super::{Dialect, TruncationAdapter};

pub(crate) const STORAGE_NAMES_SQL: &str = "SHOW TABLES";
pub(crate) const FOREIGN_KEY_CHECKS_SQL: &str = "SELECT @@FOREIGN_KEY_CHECKS AS fk_checks";
pub(crate) const DISABLE_FOREIGN_KEY_CHECKS_SQL: &str = "SET FOREIGN_KEY_CHECKS = 0;";
/// MySQL 8.0 caches information_schema table statistics, AUTO_INCREMENT
/// included, for up to a day unless told otherwise.
pub(crate) const STATS_EXPIRY_SQL: &str = "SET SESSION information_schema_stats_expiry = 0";
pub(crate) const AUTO_INCREMENT_SQL: &str = "SELECT Auto_increment AS auto_increment \
     FROM information_schema.tables \
     WHERE table_schema = DATABASE() AND table_name = ?";

pub(crate) fn truncate_sql(table: &str) -> String {
    format!("TRUNCATE TABLE {};", Dialect::MySql.quote_name(table))
}

pub(crate) fn has_rows_sql(table: &str) -> String {
    format!(
        "SELECT EXISTS (SELECT 1 FROM {} LIMIT 1) AS has_rows",
        Dialect::MySql.quote_name(table)
    )
}

pub(crate) fn restore_foreign_key_checks_sql(saved: i64) -> String {
    format!("SET FOREIGN_KEY_CHECKS = {saved};")
}

/// MySQL / MariaDB strategy.
///
/// `TRUNCATE` is comparatively expensive on InnoDB, so this is the one dialect
/// that can skip tables which were never written to.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlAdapter;

impl MySqlAdapter {
    async fn has_rows<C>(&self, conn: &C, table: &str) -> Result<bool, DbErr>
    where
        C: ConnectionTrait,
    {
        let row = conn
            .query_one(Statement::from_string(
                DatabaseBackend::MySql,
                has_rows_sql(table),
            ))
            .await?;
        match row {
            Some(row) => Ok(row.try_get::<i64>("", "has_rows")? > 0),
            None => Ok(false),
        }
    }

    /// True when the table holds rows or its auto-increment counter has moved
    /// past 1, i.e. something was inserted at some point even if the table is
    /// empty now.
    async fn has_been_used<C>(&self, conn: &C, table: &str) -> Result<bool, DbErr>
    where
        C: ConnectionTrait,
    {
        if self.has_rows(conn, table).await? {
            return Ok(true);
        }

        let row = conn
            .query_one(Statement::from_sql_and_values(
                DatabaseBackend::MySql,
                AUTO_INCREMENT_SQL,
                [table.into()],
            ))
            .await?;
        let auto_increment = match row {
            Some(row) => row.try_get::<Option<u64>>("", "auto_increment")?,
            None => None,
        };
        Ok(auto_increment.unwrap_or(0) > 1)
    }
}

#[async_trait]
impl TruncationAdapter for MySqlAdapter {
    type Saved = i64;

    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    async fn storage_names<C>(&self, conn: &C) -> Result<Vec<String>, DbErr>
    where
        C: ConnectionTrait,
    {
        let rows = conn
            .query_all(Statement::from_string(
                DatabaseBackend::MySql,
                STORAGE_NAMES_SQL,
            ))
            .await?;
        rows.iter()
            .map(|row| row.try_get_by_index::<String>(0))
            .collect()
    }

    async fn truncate_table<C>(&self, conn: &C, table: &str, _reset_ids: bool) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        // TRUNCATE resets AUTO_INCREMENT unconditionally on MySQL.
        debug!(table, "mysql truncate");
        conn.execute(Statement::from_string(
            DatabaseBackend::MySql,
            truncate_sql(table),
        ))
        .await?;
        Ok(())
    }

    fn supports_pre_count(&self) -> bool {
        true
    }

    async fn pre_count_truncate_tables<C>(
        &self,
        conn: &C,
        tables: &[String],
        reset_ids: bool,
    ) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        if reset_ids {
            // Unknown variable before 8.0 and on MariaDB, which never cache.
            if let Err(e) = conn
                .execute(Statement::from_string(
                    DatabaseBackend::MySql,
                    STATS_EXPIRY_SQL,
                ))
                .await
            {
                debug!(error = %e, "information_schema_stats_expiry not supported");
            }
        }

        let mut dirty = Vec::with_capacity(tables.len());
        for table in tables {
            let keep = if reset_ids {
                self.has_been_used(conn, table).await?
            } else {
                self.has_rows(conn, table).await?
            };
            trace!(table = %table, keep, reset_ids, "pre_count");
            if keep {
                dirty.push(table.clone());
            }
        }

        debug!(
            candidates = tables.len(),
            dirty = dirty.len(),
            "pre_count=filtered"
        );
        self.truncate_tables(conn, &dirty, reset_ids).await
    }

    async fn disable_referential_integrity<C>(&self, conn: &C) -> Result<Self::Saved, DbErr>
    where
        C: ConnectionTrait,
    {
        let saved = match conn
            .query_one(Statement::from_string(
                DatabaseBackend::MySql,
                FOREIGN_KEY_CHECKS_SQL,
            ))
            .await?
        {
            Some(row) => row.try_get::<i64>("", "fk_checks")?,
            None => {
                return Err(DbErr::Custom(
                    "SELECT @@FOREIGN_KEY_CHECKS returned no row".to_string(),
                ))
            }
        };

        conn.execute(Statement::from_string(
            DatabaseBackend::MySql,
            DISABLE_FOREIGN_KEY_CHECKS_SQL,
        ))
        .await?;
        Ok(saved)
    }

    async fn restore_referential_integrity<C>(&self, conn: &C, saved: Self::Saved) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        conn.execute(Statement::from_string(
            DatabaseBackend::MySql,
            restore_foreign_key_checks_sql(saved),
        ))
        .await?;
        Ok(())
    }
}
