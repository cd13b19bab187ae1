//! # SensorFlow Kernel Errors
//!
//! Defines the crate-wide [`Error`] returned by [`Manager`](crate::kernel::Manager)
//! construction and shutdown.
//!
//! Every variant here is fatal: it aborts construction before any worker is
//! started. Failures of steady-state reads, writes and watches never reach this
//! type; the scheduler and the trigger watchers log them and carry on.
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::config::error::ConfigError;
use crate::plugin_system::error::PluginError;
use crate::plugin_system::traits::Role;

#[derive(Debug, ThisError)]
pub enum Error {
    /// Malformed document, invalid interval or empty wiring
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No constructor registered under the requested name
    #[error("Unknown plugin '{name}' referenced by {entry}")]
    UnknownPlugin { name: String, entry: String },

    /// The plugin exists but lacks the capability the wiring asks for
    #[error("Plugin '{plugin}' referenced by {entry} cannot be used as a {role}")]
    RoleMismatch {
        plugin: String,
        role: Role,
        entry: String,
    },

    /// The plugin constructor itself failed
    #[error("Failed to construct plugin '{plugin}': {source}")]
    Construction {
        plugin: String,
        #[source]
        source: PluginError,
    },

    /// A role-specific init (`read_init`, `write_init`, `watch_init`) failed
    #[error("Failed to initialize {role} '{plugin}' for {entry}: {source}")]
    Initialization {
        plugin: String,
        role: Role,
        entry: String,
        #[source]
        source: PluginError,
    },

    /// A worker task panicked and could not be joined cleanly
    #[error("Worker '{worker}' terminated abnormally: {message}")]
    Join { worker: String, message: String },
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl Error {
    /// The wiring location (e.g. `connections[0].outputs[1]`) this error points at, if any.
    pub fn entry(&self) -> Option<&str> {
        match self {
            Error::UnknownPlugin { entry, .. }
            | Error::RoleMismatch { entry, .. }
            | Error::Initialization { entry, .. } => Some(entry),
            Error::Config(ConfigError::InvalidInterval { entry, .. }) => Some(entry),
            _ => None,
        }
    }
}
