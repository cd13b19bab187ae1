use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::kernel::error::{Error, Result};
use crate::plugin_system::adapter::{SinkRole, SourceRole, WatcherRole};
use crate::plugin_system::error::PluginError;
use crate::plugin_system::traits::{Capabilities, Parameters, Plugin, Role};

// This type represents an owned, sendable future
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a constructor resolves to
pub type ConstructorFuture = BoxFuture<'static, std::result::Result<Arc<dyn Plugin>, PluginError>>;

/// Builds one plugin singleton from its top-level parameters
pub type PluginConstructor = Arc<dyn Fn(Parameters) -> ConstructorFuture + Send + Sync>;

/// Catalog of available plugins, keyed by name.
///
/// The catalog only knows how to build plugins; the instances themselves live
/// in a [`PluginInstances`] owned by one manager.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    constructors: HashMap<String, PluginConstructor>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Register a constructor. A later registration under the same name replaces
    /// the earlier one.
    pub fn register<F, Fut>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(Parameters) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Arc<dyn Plugin>, PluginError>> + Send + 'static,
    {
        let name = name.into();
        let constructor: PluginConstructor =
            Arc::new(move |params: Parameters| -> ConstructorFuture { Box::pin(factory(params)) });
        if self.constructors.insert(name.clone(), constructor).is_some() {
            log::debug!("Plugin constructor for '{}' replaced", name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    fn constructor(&self, name: &str) -> Option<PluginConstructor> {
        self.constructors.get(name).cloned()
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names())
            .finish()
    }
}

/// A constructed plugin singleton and its capability handles
pub struct PluginInstance {
    name: String,
    plugin: Arc<dyn Plugin>,
    capabilities: Capabilities,
}

impl PluginInstance {
    fn new(name: String, plugin: Arc<dyn Plugin>) -> Self {
        let capabilities = Arc::clone(&plugin).capabilities();
        Self {
            name,
            plugin,
            capabilities,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn plugin(&self) -> &Arc<dyn Plugin> {
        &self.plugin
    }

    fn role_mismatch(&self, role: Role, entry: &str) -> Error {
        Error::RoleMismatch {
            plugin: self.name.clone(),
            role,
            entry: entry.to_string(),
        }
    }

    /// The source handle, or `RoleMismatch` naming `entry`
    pub fn require_source(&self, entry: &str) -> Result<Arc<dyn SourceRole>> {
        self.capabilities
            .source()
            .cloned()
            .ok_or_else(|| self.role_mismatch(Role::Source, entry))
    }

    /// The sink handle, or `RoleMismatch` naming `entry`
    pub fn require_sink(&self, entry: &str) -> Result<Arc<dyn SinkRole>> {
        self.capabilities
            .sink()
            .cloned()
            .ok_or_else(|| self.role_mismatch(Role::Sink, entry))
    }

    /// The watcher handle, or `RoleMismatch` naming `entry`
    pub fn require_watcher(&self, entry: &str) -> Result<Arc<dyn WatcherRole>> {
        self.capabilities
            .watcher()
            .cloned()
            .ok_or_else(|| self.role_mismatch(Role::Watcher, entry))
    }
}

impl fmt::Debug for PluginInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginInstance")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

/// Singleton cache for one manager: each name is constructed at most once.
pub struct PluginInstances {
    registry: Arc<PluginRegistry>,
    instances: HashMap<String, Arc<PluginInstance>>,
    /// Resolution order, used to close singletons deterministically
    order: Vec<String>,
}

impl PluginInstances {
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self {
            registry,
            instances: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Return the singleton for `name`, constructing it on first use.
    ///
    /// `params` only matter on that first construction; once cached, the
    /// instance is returned as-is. `entry` names the wiring location for errors.
    pub async fn resolve(
        &mut self,
        name: &str,
        params: Option<&Parameters>,
        entry: &str,
    ) -> Result<Arc<PluginInstance>> {
        if let Some(instance) = self.instances.get(name) {
            return Ok(Arc::clone(instance));
        }

        let constructor = self.registry.constructor(name).ok_or_else(|| Error::UnknownPlugin {
            name: name.to_string(),
            entry: entry.to_string(),
        })?;

        let params = params.cloned().unwrap_or_default();
        let plugin = constructor(params)
            .await
            .map_err(|source| Error::Construction {
                plugin: name.to_string(),
                source,
            })?;

        let instance = Arc::new(PluginInstance::new(name.to_string(), plugin));
        log::debug!(
            "Constructed plugin '{}' with roles {:?}",
            name,
            instance.capabilities().roles()
        );
        self.instances.insert(name.to_string(), Arc::clone(&instance));
        self.order.push(name.to_string());
        Ok(instance)
    }

    pub fn get(&self, name: &str) -> Option<Arc<PluginInstance>> {
        self.instances.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.instances.contains_key(name)
    }

    /// Names in resolution order
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Close every singleton once, in resolution order, and forget them.
    pub async fn close_all(&mut self) {
        for name in self.order.drain(..) {
            if let Some(instance) = self.instances.remove(&name) {
                log::debug!("Closing plugin '{}'", name);
                instance.plugin.close().await;
            }
        }
    }
}

impl fmt::Debug for PluginInstances {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginInstances")
            .field("resolved", &self.order)
            .finish_non_exhaustive()
    }
}
