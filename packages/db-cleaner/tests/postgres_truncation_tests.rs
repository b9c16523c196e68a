//! PostgreSQL truncation, verified against the recorded statement log.
//!
//! Trigger toggling and version detection are reference behaviour here; these
//! tests pin the statements issued, not server-side effects.

mod common;

use common::statement_log;
use db_cleaner::{CleanerError, Truncation};
use db_cleaner_test_support::mock::{
    error, exec_ok, exec_ok_n, into_conn, mock, names, single, stmt, MockRow,
};
use sea_orm::{DatabaseBackend, DbErr, Transaction};

const BACKEND: DatabaseBackend = DatabaseBackend::Postgres;
const SERVER_VERSION: &str = "SHOW server_version";
const STORAGE_NAMES: &str = "SELECT table_name::text AS table_name \
     FROM \"information_schema\".\"tables\" \
     WHERE table_schema = current_schema() and table_type = 'BASE TABLE'";

fn version(v: &str) -> Vec<MockRow> {
    single("server_version", v.to_string())
}

fn tables(list: &[&str]) -> Vec<MockRow> {
    names("table_name", list)
}

fn triggers(list: &[&str], action: &str) -> Transaction {
    let sql = list
        .iter()
        .map(|t| format!("ALTER TABLE \"{t}\" {action} TRIGGER ALL"))
        .collect::<Vec<_>>()
        .join(";");
    stmt(BACKEND, sql)
}

const ALL: &[&str] = &["users", "seaql_migrations", "orders"];

#[tokio::test]
async fn truncates_in_one_statement_between_trigger_toggles(
) -> Result<(), Box<dyn std::error::Error>> {
    let conn = into_conn(
        mock(BACKEND)
            .append_query_results([
                version("16.2 (Debian 16.2-1.pgdg120+2)"),
                tables(ALL),
                tables(ALL),
                version("16.2 (Debian 16.2-1.pgdg120+2)"),
                tables(ALL),
            ])
            .append_exec_results(exec_ok_n(3)),
    );

    Truncation::builder().build()?.clean(&conn).await?;

    assert_eq!(
        statement_log(conn),
        vec![
            stmt(BACKEND, SERVER_VERSION),
            stmt(BACKEND, STORAGE_NAMES),
            triggers(ALL, "DISABLE"),
            stmt(BACKEND, STORAGE_NAMES),
            stmt(
                BACKEND,
                "TRUNCATE TABLE \"users\", \"orders\" RESTART IDENTITY;"
            ),
            stmt(BACKEND, SERVER_VERSION),
            stmt(BACKEND, STORAGE_NAMES),
            triggers(ALL, "ENABLE"),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn keep_ids_continues_identity() -> Result<(), Box<dyn std::error::Error>> {
    let conn = into_conn(
        mock(BACKEND)
            .append_query_results([
                version("15.4"),
                tables(&["users"]),
                version("15.4"),
                tables(&["users"]),
            ])
            .append_exec_results(exec_ok_n(3)),
    );

    Truncation::builder()
        .with_only(["users"])
        .with_reset_ids(false)
        .build()?
        .clean(&conn)
        .await?;

    let log = statement_log(conn);
    assert!(log.contains(&stmt(
        BACKEND,
        "TRUNCATE TABLE \"users\" CONTINUE IDENTITY;"
    )));
    Ok(())
}

#[tokio::test]
async fn version_check_errors_mean_unsupported() -> Result<(), Box<dyn std::error::Error>> {
    let conn = into_conn(
        mock(BACKEND)
            .append_query_errors([error("permission denied")])
            .append_query_results([tables(&["users"])])
            .append_query_errors([error("permission denied")])
            .append_exec_results([exec_ok()]),
    );

    Truncation::builder().build()?.clean(&conn).await?;

    assert_eq!(
        statement_log(conn),
        vec![
            stmt(BACKEND, SERVER_VERSION),
            stmt(BACKEND, STORAGE_NAMES),
            stmt(BACKEND, "TRUNCATE TABLE \"users\" RESTART IDENTITY;"),
            stmt(BACKEND, SERVER_VERSION),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn old_servers_skip_trigger_toggle() -> Result<(), Box<dyn std::error::Error>> {
    let conn = into_conn(
        mock(BACKEND)
            .append_query_results([version("8.0.26"), tables(&["users"]), version("8.0.26")])
            .append_exec_results([exec_ok()]),
    );

    Truncation::builder().build()?.clean(&conn).await?;

    assert_eq!(
        statement_log(conn),
        vec![
            stmt(BACKEND, SERVER_VERSION),
            stmt(BACKEND, STORAGE_NAMES),
            stmt(BACKEND, "TRUNCATE TABLE \"users\" RESTART IDENTITY;"),
            stmt(BACKEND, SERVER_VERSION),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn triggers_are_re_enabled_when_truncate_fails() -> Result<(), Box<dyn std::error::Error>> {
    let conn = into_conn(
        mock(BACKEND)
            .append_query_results([
                version("16.2"),
                tables(&["users"]),
                tables(&["users"]),
                version("16.2"),
                tables(&["users"]),
            ])
            .append_exec_results([exec_ok()])
            .append_exec_errors([error("deadlock detected")])
            .append_exec_results([exec_ok()]),
    );

    let err = Truncation::builder()
        .build()?
        .clean(&conn)
        .await
        .unwrap_err();
    assert!(matches!(err, CleanerError::Db(DbErr::Custom(ref m)) if m == "deadlock detected"));

    let log = statement_log(conn);
    assert_eq!(log.last(), Some(&triggers(&["users"], "ENABLE")));
    Ok(())
}

#[tokio::test]
async fn empty_truncation_set_issues_no_truncate() -> Result<(), Box<dyn std::error::Error>> {
    let conn = into_conn(
        mock(BACKEND)
            .append_query_results([
                version("16.2"),
                tables(&[]),
                tables(&[]),
                version("16.2"),
                tables(&[]),
            ])
            .append_exec_results(exec_ok_n(0)),
    );

    Truncation::builder().build()?.clean(&conn).await?;

    assert_eq!(
        statement_log(conn),
        vec![
            stmt(BACKEND, SERVER_VERSION),
            stmt(BACKEND, STORAGE_NAMES),
            stmt(BACKEND, STORAGE_NAMES),
            stmt(BACKEND, SERVER_VERSION),
            stmt(BACKEND, STORAGE_NAMES),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn schema_qualified_names_are_quoted_per_part() -> Result<(), Box<dyn std::error::Error>> {
    let conn = into_conn(
        mock(BACKEND)
            .append_query_errors([error("no version")])
            .append_query_errors([error("no version")])
            .append_exec_results([exec_ok()]),
    );

    Truncation::builder()
        .with_only(["audit.events", "public.users"])
        .build()?
        .clean(&conn)
        .await?;

    let log = statement_log(conn);
    assert!(log.contains(&stmt(
        BACKEND,
        "TRUNCATE TABLE \"audit\".\"events\", \"public\".\"users\" RESTART IDENTITY;"
    )));
    Ok(())
}
