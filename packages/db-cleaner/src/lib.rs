//! Test-database cleaning for sea-orm connections.
//!
//! Truncates every application table (or a chosen subset) between test runs,
//! using dialect-specific SQL for MySQL, PostgreSQL and SQLite. Foreign key
//! enforcement is suspended for the duration of the truncation where the
//! dialect allows it.

pub mod config;
pub mod dialect;
pub mod error;
pub mod infra;
pub mod integrity;
pub mod safeguard;
pub mod truncation;

pub use config::options::TruncationOptions;
pub use dialect::{Dialect, MySqlAdapter, PostgresAdapter, SqliteAdapter, TruncationAdapter};
pub use error::CleanerError;
pub use infra::connect::{connect_single_session, sanitize_db_url};
pub use integrity::without_referential_integrity;
pub use truncation::{Truncation, TruncationBuilder};
