//! Helpers for asserting the exact statements a cleaner issues.
//!
//! Dialects without a local server (MySQL, PostgreSQL) are exercised against
//! `MockDatabase`; every statement lands in the transaction log, which tests
//! compare against the expected SQL.

use std::collections::BTreeMap;

use sea_orm::{
    DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, MockExecResult, Statement,
    Transaction, Value,
};

/// Row shape accepted by `MockDatabase::append_query_results`.
pub type MockRow = BTreeMap<String, Value>;

/// Result of a statement that changed nothing of interest.
pub fn exec_ok() -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected: 0,
    }
}

pub fn exec_ok_n(n: usize) -> Vec<MockExecResult> {
    (0..n).map(|_| exec_ok()).collect()
}

/// One result row from `(column, value)` pairs.
pub fn row<I, V>(pairs: I) -> MockRow
where
    I: IntoIterator<Item = (&'static str, V)>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.into()))
        .collect()
}

/// A result set with a single row holding a single column.
pub fn single<V: Into<Value>>(column: &'static str, value: V) -> Vec<MockRow> {
    vec![row([(column, value)])]
}

/// A result set with no rows.
pub fn empty() -> Vec<MockRow> {
    Vec::new()
}

/// One string column per table name.
pub fn names(column: &'static str, tables: &[&str]) -> Vec<MockRow> {
    tables.iter().map(|t| row([(column, *t)])).collect()
}

pub fn error(message: &str) -> DbErr {
    DbErr::Custom(message.to_string())
}

/// Expected log entry for a statement issued without bound values.
pub fn stmt(backend: DatabaseBackend, sql: impl Into<String>) -> Transaction {
    Transaction::one(Statement::from_string(backend, sql))
}

/// Expected log entry for a statement with bound values.
pub fn stmt_with<I>(backend: DatabaseBackend, sql: &str, values: I) -> Transaction
where
    I: IntoIterator<Item = Value>,
{
    Transaction::from_sql_and_values(backend, sql, values)
}

/// Start a mock for `backend`; finish it with [`into_conn`].
pub fn mock(backend: DatabaseBackend) -> MockDatabase {
    MockDatabase::new(backend)
}

pub fn into_conn(db: MockDatabase) -> DatabaseConnection {
    db.into_connection()
}
