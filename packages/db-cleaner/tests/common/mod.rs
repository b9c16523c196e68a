#![allow(dead_code)]

use sea_orm::{DatabaseConnection, Transaction};

// Logging is auto-installed for every test binary that pulls this module in.
#[ctor::ctor]
fn init_logging() {
    db_cleaner_test_support::logging::init();
}

/// Consume a mock connection and return what it was asked to run.
pub fn statement_log(conn: DatabaseConnection) -> Vec<Transaction> {
    conn.into_transaction_log()
}
