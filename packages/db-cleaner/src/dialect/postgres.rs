use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseBackend, DbErr, Statement};
use tracing::{debug, warn};

use super::{Dialect, TruncationAdapter};

pub(crate) const STORAGE_NAMES_SQL: &str = "SELECT table_name::text AS table_name \
     FROM \"information_schema\".\"tables\" \
     WHERE table_schema = current_schema() and table_type = 'BASE TABLE'";
pub(crate) const SERVER_VERSION_SQL: &str = "SHOW server_version";

/// First release with `ALTER TABLE ... DISABLE TRIGGER ALL`.
const TRIGGER_TOGGLE_MIN_VERSION: (u32, u32) = (8, 1);

fn identity_clause(reset_ids: bool) -> &'static str {
    if reset_ids {
        "RESTART IDENTITY"
    } else {
        "CONTINUE IDENTITY"
    }
}

pub(crate) fn truncate_sql(table: &str, reset_ids: bool) -> String {
    format!(
        "TRUNCATE TABLE {} {} CASCADE;",
        Dialect::Postgres.quote_name(table),
        identity_clause(reset_ids)
    )
}

pub(crate) fn truncate_many_sql(tables: &[String], reset_ids: bool) -> String {
    let quoted = tables
        .iter()
        .map(|t| Dialect::Postgres.quote_name(t))
        .collect::<Vec<_>>()
        .join(", ");
    format!("TRUNCATE TABLE {quoted} {};", identity_clause(reset_ids))
}

pub(crate) fn trigger_toggle_sql(tables: &[String], enable: bool) -> String {
    let action = if enable { "ENABLE" } else { "DISABLE" };
    tables
        .iter()
        .map(|t| {
            format!(
                "ALTER TABLE {} {action} TRIGGER ALL",
                Dialect::Postgres.quote_name(t)
            )
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Whether a `server_version` string (e.g. `"16.2 (Debian 16.2-1)"`) is new
/// enough for trigger toggling. Unparseable versions count as too old.
pub(crate) fn version_supports_trigger_toggle(version: &str) -> bool {
    let number = version.split_whitespace().next().unwrap_or_default();
    let mut parts = number.split('.').map(leading_number);
    let Some(Some(major)) = parts.next() else {
        return false;
    };
    let minor = parts.next().flatten().unwrap_or(0);
    (major, minor) >= TRIGGER_TOGGLE_MIN_VERSION
}

// Pre-release builds report e.g. "17beta1".
fn leading_number(part: &str) -> Option<u32> {
    let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// PostgreSQL strategy.
///
/// Trigger toggling requires table ownership (or superuser); on managed
/// databases where that is missing the `ALTER TABLE` batch fails and the
/// error propagates.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresAdapter;

impl PostgresAdapter {
    /// Any failure while asking is treated as "unsupported".
    pub async fn supports_disable_referential_integrity<C>(&self, conn: &C) -> bool
    where
        C: ConnectionTrait,
    {
        let row = conn
            .query_one(Statement::from_string(
                DatabaseBackend::Postgres,
                SERVER_VERSION_SQL,
            ))
            .await;

        let version = match row {
            Ok(Some(row)) => match row.try_get::<String>("", "server_version") {
                Ok(version) => version,
                Err(e) => {
                    debug!(error = %e, "server_version unreadable, trigger toggle disabled");
                    return false;
                }
            },
            Ok(None) => return false,
            Err(e) => {
                debug!(error = %e, "server_version query failed, trigger toggle disabled");
                return false;
            }
        };

        version_supports_trigger_toggle(&version)
    }

    async fn toggle_triggers<C>(&self, conn: &C, enable: bool) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        let tables = self.storage_names(conn).await?;
        if tables.is_empty() {
            return Ok(());
        }
        debug!(tables = tables.len(), enable, "postgres trigger toggle");
        conn.execute_unprepared(&trigger_toggle_sql(&tables, enable))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TruncationAdapter for PostgresAdapter {
    type Saved = ();

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn storage_names<C>(&self, conn: &C) -> Result<Vec<String>, DbErr>
    where
        C: ConnectionTrait,
    {
        let rows = conn
            .query_all(Statement::from_string(
                DatabaseBackend::Postgres,
                STORAGE_NAMES_SQL,
            ))
            .await?;
        rows.iter()
            .map(|row| row.try_get::<String>("", "table_name"))
            .collect()
    }

    async fn truncate_table<C>(&self, conn: &C, table: &str, reset_ids: bool) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        conn.execute(Statement::from_string(
            DatabaseBackend::Postgres,
            truncate_sql(table, reset_ids),
        ))
        .await?;
        Ok(())
    }

    /// One statement for the whole set so the truncation is atomic.
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
        debug!(tables = tables.len(), "postgres truncate");
        conn.execute(Statement::from_string(
            DatabaseBackend::Postgres,
            truncate_many_sql(tables, reset_ids),
        ))
        .await?;
        Ok(())
    }

    async fn disable_referential_integrity<C>(&self, conn: &C) -> Result<Self::Saved, DbErr>
    where
        C: ConnectionTrait,
    {
        if self.supports_disable_referential_integrity(conn).await {
            self.toggle_triggers(conn, false).await?;
        } else {
            warn!("postgres server does not support DISABLE TRIGGER ALL; truncating with triggers enabled");
        }
        Ok(())
    }

    async fn restore_referential_integrity<C>(&self, conn: &C, _saved: Self::Saved) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        if self.supports_disable_referential_integrity(conn).await {
            self.toggle_triggers(conn, true).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_gate() {
        assert!(version_supports_trigger_toggle("8.1"));
        assert!(version_supports_trigger_toggle("9.0.4"));
        assert!(version_supports_trigger_toggle("16.2 (Debian 16.2-1.pgdg120+2)"));
        assert!(version_supports_trigger_toggle("17beta1"));
        assert!(!version_supports_trigger_toggle("8.0.26"));
        assert!(!version_supports_trigger_toggle("7.4"));
        assert!(!version_supports_trigger_toggle("garbage"));
        assert!(!version_supports_trigger_toggle(""));
    }

    #[test]
    fn single_table_truncate_cascades() {
        assert_eq!(
            truncate_sql("users", true),
            "TRUNCATE TABLE \"users\" RESTART IDENTITY CASCADE;"
        );
        assert_eq!(
            truncate_sql("users", false),
            "TRUNCATE TABLE \"users\" CONTINUE IDENTITY CASCADE;"
        );
    }

    #[test]
    fn many_table_truncate_is_one_statement() {
        let tables = vec!["users".to_string(), "orders".to_string()];
        assert_eq!(
            truncate_many_sql(&tables, true),
            "TRUNCATE TABLE \"users\", \"orders\" RESTART IDENTITY;"
        );
    }

    #[test]
    fn trigger_batch_joins_with_semicolons() {
        let tables = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            trigger_toggle_sql(&tables, false),
            "ALTER TABLE \"a\" DISABLE TRIGGER ALL;ALTER TABLE \"b\" DISABLE TRIGGER ALL"
        );
        assert_eq!(
            trigger_toggle_sql(&tables, true),
            "ALTER TABLE \"a\" ENABLE TRIGGER ALL;ALTER TABLE \"b\" ENABLE TRIGGER ALL"
        );
    }
}
