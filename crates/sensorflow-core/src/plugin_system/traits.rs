use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::plugin_system::adapter::{
    SinkAdapter, SinkRole, SourceAdapter, SourceRole, WatcherAdapter, WatcherRole,
};
use crate::plugin_system::error::PluginError;

/// The role a plugin plays at one usage site of the wiring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Produces readings for a connection
    Source,
    /// Consumes values, as a connection output or a trigger action
    Sink,
    /// Blocks until an event and yields its value
    Watcher,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Source => write!(f, "source"),
            Role::Sink => write!(f, "sink"),
            Role::Watcher => write!(f, "watcher"),
        }
    }
}

/// Raw parameter document handed to constructors and role initializers.
///
/// The document is kept format-neutral (YAML, TOML and JSON all land here)
/// and only decoded by the plugin that understands it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(serde_json::Value);

impl Parameters {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// An empty map
    pub fn empty() -> Self {
        Self(serde_json::Value::Object(serde_json::Map::new()))
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            serde_json::Value::Null => true,
            serde_json::Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    /// Decode into a plugin's parameter struct.
    ///
    /// A missing document decodes like an empty map, so structs whose fields
    /// all carry `#[serde(default)]` accept it.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, PluginError> {
        let value = match &self.0 {
            serde_json::Value::Null => serde_json::Value::Object(serde_json::Map::new()),
            other => other.clone(),
        };
        Ok(serde_json::from_value(value)?)
    }
}

impl From<serde_json::Value> for Parameters {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// A plugin that produces readings
#[async_trait]
pub trait Source: Send + Sync {
    /// Per-usage state created by [`read_init`](Source::read_init)
    type Context: Send + 'static;

    async fn read_init(&self, params: &Parameters) -> Result<Self::Context, PluginError>;

    async fn read(&self, ctx: &mut Self::Context) -> Result<f64, PluginError>;

    /// Release the per-usage state. Called exactly once, after the last `read`.
    async fn read_close(&self, _ctx: Self::Context) {}
}

/// A plugin that consumes values
#[async_trait]
pub trait Sink: Send + Sync {
    /// Per-usage state created by [`write_init`](Sink::write_init)
    type Context: Send + 'static;

    async fn write_init(&self, params: &Parameters) -> Result<Self::Context, PluginError>;

    async fn write(&self, ctx: &mut Self::Context, value: f64) -> Result<(), PluginError>;

    /// Release the per-usage state. Called exactly once, after the last `write`.
    async fn write_close(&self, _ctx: Self::Context) {}
}

/// A plugin that blocks until an event occurs
#[async_trait]
pub trait Watcher: Send + Sync {
    /// Per-usage state created by [`watch_init`](Watcher::watch_init)
    type Context: Send + 'static;

    async fn watch_init(&self, params: &Parameters) -> Result<Self::Context, PluginError>;

    /// Wait for the next event.
    ///
    /// Implementations must return [`PluginError::Cancelled`] once `cancel`
    /// fires instead of a generic error.
    async fn watch(
        &self,
        ctx: &mut Self::Context,
        cancel: &CancellationToken,
    ) -> Result<f64, PluginError>;

    /// Release the per-usage state. Called exactly once, after the last `watch`.
    async fn watch_close(&self, _ctx: Self::Context) {}
}

/// Core trait that all plugins must implement
#[async_trait]
pub trait Plugin: Send + Sync {
    /// The roles this plugin can be wired into.
    ///
    /// Typically `Capabilities::new().with_sink(self)` and friends.
    fn capabilities(self: Arc<Self>) -> Capabilities;

    /// Release the singleton. Called once at manager shutdown, after every
    /// task and trigger using it has stopped.
    async fn close(&self) {}
}

/// Optional capability handles of one plugin, checked once at wiring time
#[derive(Clone, Default)]
pub struct Capabilities {
    source: Option<Arc<dyn SourceRole>>,
    sink: Option<Arc<dyn SinkRole>>,
    watcher: Option<Arc<dyn WatcherRole>>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source<S: Source + 'static>(mut self, plugin: Arc<S>) -> Self {
        self.source = Some(Arc::new(SourceAdapter::new(plugin)));
        self
    }

    pub fn with_sink<S: Sink + 'static>(mut self, plugin: Arc<S>) -> Self {
        self.sink = Some(Arc::new(SinkAdapter::new(plugin)));
        self
    }

    pub fn with_watcher<W: Watcher + 'static>(mut self, plugin: Arc<W>) -> Self {
        self.watcher = Some(Arc::new(WatcherAdapter::new(plugin)));
        self
    }

    pub fn source(&self) -> Option<&Arc<dyn SourceRole>> {
        self.source.as_ref()
    }

    pub fn sink(&self) -> Option<&Arc<dyn SinkRole>> {
        self.sink.as_ref()
    }

    pub fn watcher(&self) -> Option<&Arc<dyn WatcherRole>> {
        self.watcher.as_ref()
    }

    pub fn has(&self, role: Role) -> bool {
        match role {
            Role::Source => self.source.is_some(),
            Role::Sink => self.sink.is_some(),
            Role::Watcher => self.watcher.is_some(),
        }
    }

    pub fn roles(&self) -> Vec<Role> {
        [Role::Source, Role::Sink, Role::Watcher]
            .into_iter()
            .filter(|role| self.has(*role))
            .collect()
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("roles", &self.roles())
            .finish()
    }
}
