use std::env;

use tracing::warn;

use super::options::TruncationOptions;
use crate::error::CleanerError;

pub const DATABASE_URL: &str = "DATABASE_URL";
pub const ONLY: &str = "DB_CLEANER_ONLY";
pub const EXCEPT: &str = "DB_CLEANER_EXCEPT";
pub const PRE_COUNT: &str = "DB_CLEANER_PRE_COUNT";
pub const RESET_IDS: &str = "DB_CLEANER_RESET_IDS";

/// Connection URL of the database to clean.
pub fn database_url() -> Result<String, CleanerError> {
    must_var(DATABASE_URL)
}

/// Build options from `DB_CLEANER_*` variables on top of the defaults.
///
/// Unset or empty variables keep the default value.
pub fn options_from_env() -> Result<TruncationOptions, CleanerError> {
    let mut options = TruncationOptions::default();

    if let Some(only) = optional_var(ONLY) {
        options.only = Some(parse_list(&only));
    }
    if let Some(except) = optional_var(EXCEPT) {
        options.except = parse_list(&except);
    }
    if let Some(pre_count) = optional_var(PRE_COUNT) {
        options.pre_count = parse_bool(PRE_COUNT, &pre_count)?;
    }
    if let Some(reset_ids) = optional_var(RESET_IDS) {
        options.reset_ids = parse_bool(RESET_IDS, &reset_ids)?;
    }

    options.validate()?;
    Ok(options)
}

/// Comma-separated table list; blanks are dropped.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn parse_bool(name: &str, raw: &str) -> Result<bool, CleanerError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(CleanerError::config(format!(
            "Environment variable '{name}' must be a boolean, got '{other}'"
        ))),
    }
}

/// Whether a flag-style variable is set to a true value.
///
/// These flags unlock safety overrides, so anything that does not parse
/// as a boolean counts as unset.
pub fn flag_set(name: &str) -> bool {
    let Some(raw) = optional_var(name) else {
        return false;
    };
    match parse_bool(name, &raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "ignoring unparseable flag");
            false
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn must_var(name: &str) -> Result<String, CleanerError> {
    optional_var(name).ok_or_else(|| {
        CleanerError::config(format!("Required environment variable '{name}' is not set"))
    })
}
