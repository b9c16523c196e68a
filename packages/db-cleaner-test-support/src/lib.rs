//! Test support for the db-cleaner workspace
//!
//! Logging initialization shared by every test binary, statement-log helpers
//! over sea-orm's `MockDatabase`, and in-memory SQLite fixtures.

pub mod logging;
pub mod mock;
pub mod sqlite;
