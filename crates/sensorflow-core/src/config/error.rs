//! # SensorFlow Configuration Errors
//!
//! [`ConfigError`] covers everything that can be wrong with a wiring document
//! before a single plugin is touched: unreadable files, unknown formats, parse
//! failures, bad intervals and documents that wire nothing at all.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported configuration format for path: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("Deserialization from '{format}' failed: {message}")]
    Parse { format: String, message: String },

    #[error("Invalid interval '{value}' for {entry}: {reason}")]
    InvalidInterval {
        entry: String,
        value: String,
        reason: String,
    },

    #[error("No connections or triggers configured; nothing to run")]
    NoEntries,
}

impl ConfigError {
    pub(crate) fn parse(format: impl Into<String>, err: impl std::fmt::Display) -> Self {
        ConfigError::Parse {
            format: format.into(),
            message: err.to_string(),
        }
    }
}
