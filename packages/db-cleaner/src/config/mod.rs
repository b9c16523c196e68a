//! Cleaner configuration: typed options plus their environment overlay.

pub mod env;
pub mod options;

pub use options::TruncationOptions;
