//! # SensorFlow Plugin System
//!
//! Plugins are the interchangeable collaborators the manager wires together:
//! sources that produce readings, sinks that consume them, and watchers that
//! block until an event fires.
//!
//! ## Key Submodules and Responsibilities:
//!
//! - **[`traits`]**: the [`Plugin`] trait, the typed role traits ([`Source`],
//!   [`Sink`], [`Watcher`]) with their per-usage `Context` types, and
//!   [`Capabilities`].
//! - **[`adapter`]**: erases each plugin's context type behind object-safe
//!   role handles and bound usages.
//! - **[`registry`]**: the [`PluginRegistry`] catalog of constructors and the
//!   per-manager [`PluginInstances`] singleton cache.
//! - **[`error`]**: [`PluginError`], returned by plugin implementations.
pub mod adapter;
pub mod error;
pub mod registry;
pub mod traits;

pub use adapter::{Bound, BoundSink, BoundSource, BoundWatcher};
pub use error::PluginError;
pub use registry::{PluginInstance, PluginInstances, PluginRegistry};
pub use traits::{Capabilities, Parameters, Plugin, Role, Sink, Source, Watcher};
// Test module declaration
#[cfg(test)]
mod tests;
