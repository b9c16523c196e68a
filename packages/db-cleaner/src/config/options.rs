use std::collections::HashSet;

use crate::error::CleanerError;

/// Bookkeeping tables written by `sea-orm-migration`; never truncated.
pub const DEFAULT_MIGRATION_TABLES: &[&str] = &["seaql_migrations"];

/// What to truncate and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncationOptions {
    /// Restrict truncation to these tables instead of everything discovered.
    pub only: Option<Vec<String>>,
    /// Tables to leave alone.
    pub except: Vec<String>,
    /// Ask the dialect to skip tables that were never written to.
    pub pre_count: bool,
    /// Reset identity / auto-increment counters.
    pub reset_ids: bool,
    /// Always excluded, on top of `except`.
    pub migration_tables: Vec<String>,
}

impl Default for TruncationOptions {
    fn default() -> Self {
        Self {
            only: None,
            except: Vec::new(),
            pre_count: false,
            reset_ids: true,
            migration_tables: DEFAULT_MIGRATION_TABLES
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

impl TruncationOptions {
    pub fn validate(&self) -> Result<(), CleanerError> {
        if self.only.is_some() && !self.except.is_empty() {
            return Err(CleanerError::config(
                "`only` and `except` are mutually exclusive; specify one of them",
            ));
        }
        Ok(())
    }

    pub fn is_excluded(&self, table: &str) -> bool {
        self.except.iter().any(|t| t == table) || self.migration_tables.iter().any(|t| t == table)
    }

    /// The truncation set: `only` if given, otherwise `discovered`, minus
    /// every excluded table. Source order is kept and duplicates dropped.
    pub fn select_tables(&self, discovered: Vec<String>) -> Vec<String> {
        let source = match &self.only {
            Some(only) => only.clone(),
            None => discovered,
        };
        let mut seen = HashSet::new();
        source
            .into_iter()
            .filter(|t| !self.is_excluded(t))
            .filter(|t| seen.insert(t.clone()))
            .collect()
    }
}
