//! # SensorFlow Plugin Errors
//!
//! [`PluginError`] is the error type plugin implementations return from their
//! constructors and from every role operation. `Cancelled` is not a failure:
//! it is the outcome a [`Watcher`](crate::plugin_system::Watcher) reports when
//! it observed the cancellation token.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Invalid parameters: {message}")]
    InvalidParameters {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation failed: {0}")]
    Operation(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl PluginError {
    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        PluginError::InvalidParameters {
            message: message.into(),
            source: None,
        }
    }

    pub fn operation(message: impl Into<String>) -> Self {
        PluginError::Operation(message.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PluginError::Cancelled)
    }
}

impl From<serde_json::Error> for PluginError {
    fn from(err: serde_json::Error) -> Self {
        PluginError::InvalidParameters {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
