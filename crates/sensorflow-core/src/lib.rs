pub mod config;
pub mod kernel;
pub mod plugin_system;
pub mod scheduler;
pub mod trigger;

// Re-export key public types/traits for easier use by the binary and plugins
pub use config::{ConfigFormat, WiringConfig};
pub use kernel::{Error, Manager, ManagerState, Result};
pub use plugin_system::{
    Capabilities, Parameters, Plugin, PluginError, PluginRegistry, Sink, Source, Watcher,
};
pub use tokio_util::sync::CancellationToken;

#[cfg(test)]
mod tests;
