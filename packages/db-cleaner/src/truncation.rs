use std::time::Instant;

use sea_orm::ConnectionTrait;
use tracing::{debug, info};

use crate::config::options::TruncationOptions;
use crate::dialect::{Dialect, MySqlAdapter, PostgresAdapter, SqliteAdapter, TruncationAdapter};
use crate::error::CleanerError;
use crate::integrity::without_referential_integrity;

/// Builder for [`Truncation`].
///
/// ```
/// use db_cleaner::Truncation;
///
/// let cleaner = Truncation::builder()
///     .with_except(["countries"])
///     .with_pre_count(true)
///     .build()
///     .unwrap();
/// assert!(cleaner.options().pre_count);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TruncationBuilder {
    options: TruncationOptions,
}

impl TruncationBuilder {
    pub fn with_only<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.only = Some(tables.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_except<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.except = tables.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_pre_count(mut self, pre_count: bool) -> Self {
        self.options.pre_count = pre_count;
        self
    }

    pub fn with_reset_ids(mut self, reset_ids: bool) -> Self {
        self.options.reset_ids = reset_ids;
        self
    }

    /// Replace the default migration bookkeeping tables.
    pub fn with_migration_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.migration_tables = tables.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self) -> Result<Truncation, CleanerError> {
        Truncation::new(self.options)
    }
}

/// Truncation cleaning strategy.
///
/// Stateless between calls; one value can clean any number of connections.
/// Session-level switches such as MySQL's `FOREIGN_KEY_CHECKS` only hold for
/// one physical session, so hand it a transaction or a single-connection
/// pool (see [`crate::connect_single_session`]).
#[derive(Debug, Clone)]
pub struct Truncation {
    options: TruncationOptions,
}

impl Truncation {
    pub fn new(options: TruncationOptions) -> Result<Self, CleanerError> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn builder() -> TruncationBuilder {
        TruncationBuilder::default()
    }

    pub fn options(&self) -> &TruncationOptions {
        &self.options
    }

    /// Empty every selected table on `conn`.
    pub async fn clean<C>(&self, conn: &C) -> Result<(), CleanerError>
    where
        C: ConnectionTrait,
    {
        match Dialect::from(conn.get_database_backend()) {
            Dialect::MySql => self.clean_with(&MySqlAdapter, conn).await,
            Dialect::Postgres => self.clean_with(&PostgresAdapter, conn).await,
            Dialect::Sqlite => self.clean_with(&SqliteAdapter, conn).await,
        }
    }

    /// Tables [`Truncation::clean`] would empty, without touching them.
    pub async fn tables_to_truncate<C>(&self, conn: &C) -> Result<Vec<String>, CleanerError>
    where
        C: ConnectionTrait,
    {
        match Dialect::from(conn.get_database_backend()) {
            Dialect::MySql => self.select_tables(&MySqlAdapter, conn).await,
            Dialect::Postgres => self.select_tables(&PostgresAdapter, conn).await,
            Dialect::Sqlite => self.select_tables(&SqliteAdapter, conn).await,
        }
    }

    /// Clean through an explicit adapter rather than the connection's backend.
    pub async fn clean_with<A, C>(&self, adapter: &A, conn: &C) -> Result<(), CleanerError>
    where
        A: TruncationAdapter,
        C: ConnectionTrait,
    {
        let start = Instant::now();
        let dialect = adapter.dialect();
        let pre_count = self.options.pre_count && adapter.supports_pre_count();
        let reset_ids = self.options.reset_ids;

        info!(
            "clean=start dialect={} pre_count={} reset_ids={}",
            dialect, pre_count, reset_ids
        );

        let truncated = without_referential_integrity(adapter, conn, || async {
            let tables = self.select_tables(adapter, conn).await?;
            debug!(%dialect, tables = ?tables, "truncation set");

            if pre_count {
                adapter
                    .pre_count_truncate_tables(conn, &tables, reset_ids)
                    .await?;
            } else {
                adapter.truncate_tables(conn, &tables, reset_ids).await?;
            }
            Ok::<_, CleanerError>(tables.len())
        })
        .await?;

        info!(
            dialect = %dialect,
            candidates = truncated,
            elapsed_ms = start.elapsed().as_millis(),
            "clean=done"
        );
        Ok(())
    }

    async fn select_tables<A, C>(&self, adapter: &A, conn: &C) -> Result<Vec<String>, CleanerError>
    where
        A: TruncationAdapter,
        C: ConnectionTrait,
    {
        let discovered = match self.options.only {
            // Discovery is skipped when the caller names the tables.
            Some(_) => Vec::new(),
            None => adapter.storage_names(conn).await?,
        };
        Ok(self.options.select_tables(discovered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_every_option() {
        let cleaner = Truncation::builder()
            .with_only(["users", "orders"])
            .with_pre_count(true)
            .with_reset_ids(false)
            .with_migration_tables(["schema_migrations"])
            .build()
            .unwrap();

        let opts = cleaner.options();
        assert_eq!(
            opts.only.as_deref(),
            Some(&["users".to_string(), "orders".to_string()][..])
        );
        assert!(opts.pre_count);
        assert!(!opts.reset_ids);
        assert_eq!(opts.migration_tables, vec!["schema_migrations"]);
    }

    #[test]
    fn builder_rejects_only_with_except() {
        let err = Truncation::builder()
            .with_only(["users"])
            .with_except(["orders"])
            .build()
            .unwrap_err();
        assert!(matches!(err, CleanerError::Config { .. }));
    }
}
