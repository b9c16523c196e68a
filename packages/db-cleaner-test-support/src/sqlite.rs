//! In-memory SQLite fixtures.

use std::time::Duration;

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr,
    Statement,
};

/// Fresh private in-memory database.
///
/// The pool is pinned to one connection that never idles out: every SQLite
/// `:memory:` connection is its own database.
pub async fn memory_db() -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.min_connections(1)
        .max_connections(1)
        .idle_timeout(Duration::from_secs(3600))
        .max_lifetime(Duration::from_secs(3600))
        .sqlx_logging(false);
    Database::connect(opt).await
}

/// Run one or more `;`-separated statements.
pub async fn exec(conn: &DatabaseConnection, sql: &str) -> Result<(), DbErr> {
    conn.execute_unprepared(sql).await?;
    Ok(())
}

pub async fn row_count(conn: &DatabaseConnection, table: &str) -> Result<i64, DbErr> {
    let row = conn
        .query_one(Statement::from_string(
            DatabaseBackend::Sqlite,
            format!("SELECT COUNT(*) AS cnt FROM \"{table}\""),
        ))
        .await?;
    match row {
        Some(row) => row.try_get::<i64>("", "cnt"),
        None => Ok(0),
    }
}

/// AUTOINCREMENT high-water mark for `table`, if SQLite tracks one.
pub async fn sequence_value(conn: &DatabaseConnection, table: &str) -> Result<Option<i64>, DbErr> {
    let row = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT seq FROM sqlite_sequence WHERE name = ?",
            [table.into()],
        ))
        .await?;
    match row {
        Some(row) => Ok(Some(row.try_get::<i64>("", "seq")?)),
        None => Ok(None),
    }
}

/// Id assigned to the most recent insert on this connection.
pub async fn last_insert_id(conn: &DatabaseConnection) -> Result<i64, DbErr> {
    let row = conn
        .query_one(Statement::from_string(
            DatabaseBackend::Sqlite,
            "SELECT last_insert_rowid() AS id",
        ))
        .await?;
    match row {
        Some(row) => row.try_get::<i64>("", "id"),
        None => Ok(0),
    }
}

/// Current value of `PRAGMA foreign_keys` on `conn`.
pub async fn foreign_keys_enabled<C>(conn: &C) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let row = conn
        .query_one(Statement::from_string(
            DatabaseBackend::Sqlite,
            "PRAGMA foreign_keys",
        ))
        .await?;
    match row {
        Some(row) => Ok(row.try_get_by_index::<i64>(0)? != 0),
        None => Ok(false),
    }
}
