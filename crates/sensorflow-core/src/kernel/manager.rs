use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::wiring::{entry, ConnectionConfig, PluginUse, TriggerConfig, WiringConfig};
use crate::config::ConfigError;
use crate::kernel::constants;
use crate::kernel::error::{Error, Result};
use crate::plugin_system::adapter::{Bound, BoundSink, BoundSource, BoundWatcher};
use crate::plugin_system::error::PluginError;
use crate::plugin_system::registry::{PluginInstances, PluginRegistry};
use crate::plugin_system::traits::Role;
use crate::scheduler::{ConnectionTask, Scheduler};
use crate::trigger::{TriggerDispatcher, TriggerEntry};

/// Lifecycle of a [`Manager`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Constructing,
    Running,
    ShuttingDown,
    Closed,
}

impl fmt::Display for ManagerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManagerState::Constructing => write!(f, "constructing"),
            ManagerState::Running => write!(f, "running"),
            ManagerState::ShuttingDown => write!(f, "shutting down"),
            ManagerState::Closed => write!(f, "closed"),
        }
    }
}

/// Wires plugins into connection tasks and trigger entries and runs them.
///
/// A manager is running as soon as [`Manager::new`] returns. [`Manager::stop`]
/// shuts it down in a fixed order: the scheduler first, then connection
/// contexts, then the trigger watchers and their contexts, and finally every
/// plugin singleton. Calling `stop` on a closed manager is a no-op.
pub struct Manager {
    state: ManagerState,
    plugins: PluginInstances,
    cancel: CancellationToken,
    scheduler: Option<(CancellationToken, JoinHandle<Vec<ConnectionTask>>)>,
    triggers: Option<TriggerDispatcher>,
    connection_count: usize,
    trigger_count: usize,
}

impl Manager {
    /// Build every connection and trigger described by `config` and start them.
    ///
    /// Any failure aborts construction: contexts initialized so far are closed,
    /// constructed plugins are closed, and no worker is left running.
    pub async fn new(registry: Arc<PluginRegistry>, config: &WiringConfig) -> Result<Self> {
        log::info!("Starting {} v{}", constants::APP_NAME, constants::APP_VERSION);
        validate(config)?;

        let mut builder = Builder::new(registry);
        if let Err(e) = builder.build(config).await {
            log::error!("Manager construction failed: {}", e);
            builder.abort().await;
            return Err(e);
        }
        let Builder {
            plugins,
            tasks,
            entries,
        } = builder;

        let cancel = CancellationToken::new();
        let connection_count = tasks.len();
        let trigger_count = entries.len();

        let scheduler = if tasks.is_empty() {
            None
        } else {
            let token = cancel.child_token();
            let handle = Scheduler::new(tasks).spawn(token.clone());
            Some((token, handle))
        };
        let triggers = if entries.is_empty() {
            None
        } else {
            Some(TriggerDispatcher::start(entries, cancel.child_token()))
        };

        log::info!(
            "Manager running: {} connection(s), {} trigger(s), {} plugin(s)",
            connection_count,
            trigger_count,
            plugins.len()
        );
        Ok(Self {
            state: ManagerState::Running,
            plugins,
            cancel,
            scheduler,
            triggers,
            connection_count,
            trigger_count,
        })
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    pub fn connection_count(&self) -> usize {
        self.connection_count
    }

    pub fn trigger_count(&self) -> usize {
        self.trigger_count
    }

    /// Plugins constructed for this manager, in resolution order
    pub fn plugin_names(&self) -> Vec<String> {
        self.plugins.names().to_vec()
    }

    /// Shut everything down and wait until the manager is closed.
    ///
    /// Idempotent: stopping a closed manager returns `Ok(())` and does nothing.
    /// If a worker panicked, shutdown still completes and the first such
    /// failure is returned.
    pub async fn stop(&mut self) -> Result<()> {
        if self.state != ManagerState::Running {
            log::debug!("Manager already {}; stop ignored", self.state);
            return Ok(());
        }
        self.state = ManagerState::ShuttingDown;
        log::info!("Shutting down manager...");
        let mut first_error = None;

        if let Some((token, handle)) = self.scheduler.take() {
            token.cancel();
            match handle.await {
                Ok(mut tasks) => {
                    for task in tasks.iter_mut() {
                        task.close().await;
                    }
                }
                Err(e) => {
                    log::warn!("Scheduler failed, connection contexts were not released: {}", e);
                    first_error.get_or_insert(Error::Join {
                        worker: "scheduler".to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        if let Some(triggers) = self.triggers.take() {
            if let Err(e) = triggers.shutdown().await {
                first_error.get_or_insert(e);
            }
        }

        self.plugins.close_all().await;
        self.cancel.cancel();
        self.state = ManagerState::Closed;
        log::info!("Manager closed");

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        if self.state == ManagerState::Running {
            log::warn!("Manager dropped while running; cancelling workers without closing plugins");
            self.cancel.cancel();
        }
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("state", &self.state)
            .field("connections", &self.connection_count)
            .field("triggers", &self.trigger_count)
            .field("plugins", &self.plugins.names())
            .finish()
    }
}

/// Checks that need no plugin at all
fn validate(config: &WiringConfig) -> Result<()> {
    if config.is_empty() {
        return Err(ConfigError::NoEntries.into());
    }
    for (index, connection) in config.connections.iter().enumerate() {
        connection.interval(&entry::connection(index))?;
    }
    Ok(())
}

/// Accumulates everything bound during construction so a failure can undo it
struct Builder {
    plugins: PluginInstances,
    tasks: Vec<ConnectionTask>,
    entries: Vec<TriggerEntry>,
}

impl Builder {
    fn new(registry: Arc<PluginRegistry>) -> Self {
        Self {
            plugins: PluginInstances::new(registry),
            tasks: Vec::new(),
            entries: Vec::new(),
        }
    }

    async fn build(&mut self, config: &WiringConfig) -> Result<()> {
        for (name, params) in &config.plugins {
            self.plugins
                .resolve(name, Some(params), &entry::plugin(name))
                .await?;
        }
        for (index, connection) in config.connections.iter().enumerate() {
            let task = self.bind_connection(index, connection).await?;
            self.tasks.push(task);
        }
        for (index, trigger) in config.triggers.iter().enumerate() {
            let trigger_entry = self.bind_trigger(index, trigger).await?;
            self.entries.push(trigger_entry);
        }
        Ok(())
    }

    async fn bind_connection(
        &mut self,
        index: usize,
        config: &ConnectionConfig,
    ) -> Result<ConnectionTask> {
        let interval = config.interval(&entry::connection(index))?;
        let mut input = self
            .bind_source(&config.input, &entry::connection_input(index))
            .await?;

        let mut outputs = Vec::with_capacity(config.outputs.len());
        for (position, output) in config.outputs.iter().enumerate() {
            match self
                .bind_sink(output, &entry::connection_output(index, position))
                .await
            {
                Ok(bound) => outputs.push(bound),
                Err(e) => {
                    input.close().await;
                    close_sinks(&mut outputs).await;
                    return Err(e);
                }
            }
        }
        Ok(ConnectionTask::new(interval, input, outputs))
    }

    async fn bind_trigger(&mut self, index: usize, config: &TriggerConfig) -> Result<TriggerEntry> {
        let mut watch = self
            .bind_watcher(&config.watch, &entry::trigger_watch(index))
            .await?;

        let mut actions = Vec::with_capacity(config.actions.len());
        for (position, action) in config.actions.iter().enumerate() {
            match self
                .bind_sink(action, &entry::trigger_action(index, position))
                .await
            {
                Ok(bound) => actions.push(bound),
                Err(e) => {
                    watch.close().await;
                    close_sinks(&mut actions).await;
                    return Err(e);
                }
            }
        }
        Ok(TriggerEntry::new(watch, actions))
    }

    async fn bind_source(&mut self, usage: &PluginUse, at: &str) -> Result<Bound<dyn BoundSource>> {
        let instance = self.plugins.resolve(&usage.plugin, None, at).await?;
        let role = instance.require_source(at)?;
        let op = role
            .bind(&usage.parameters)
            .await
            .map_err(|source| initialization(&usage.plugin, Role::Source, at, source))?;
        Ok(Bound::new(usage.plugin.clone(), op))
    }

    async fn bind_sink(&mut self, usage: &PluginUse, at: &str) -> Result<Bound<dyn BoundSink>> {
        let instance = self.plugins.resolve(&usage.plugin, None, at).await?;
        let role = instance.require_sink(at)?;
        let op = role
            .bind(&usage.parameters)
            .await
            .map_err(|source| initialization(&usage.plugin, Role::Sink, at, source))?;
        Ok(Bound::new(usage.plugin.clone(), op))
    }

    async fn bind_watcher(
        &mut self,
        usage: &PluginUse,
        at: &str,
    ) -> Result<Bound<dyn BoundWatcher>> {
        let instance = self.plugins.resolve(&usage.plugin, None, at).await?;
        let role = instance.require_watcher(at)?;
        let op = role
            .bind(&usage.parameters)
            .await
            .map_err(|source| initialization(&usage.plugin, Role::Watcher, at, source))?;
        Ok(Bound::new(usage.plugin.clone(), op))
    }

    /// Release everything bound so far. Nothing has started running yet.
    async fn abort(mut self) {
        for task in self.tasks.iter_mut() {
            task.close().await;
        }
        for trigger_entry in self.entries.iter_mut() {
            trigger_entry.close().await;
        }
        self.plugins.close_all().await;
    }
}

async fn close_sinks(sinks: &mut [Bound<dyn BoundSink>]) {
    for sink in sinks.iter_mut() {
        sink.close().await;
    }
}

fn initialization(plugin: &str, role: Role, at: &str, source: PluginError) -> Error {
    Error::Initialization {
        plugin: plugin.to_string(),
        role,
        entry: at.to_string(),
        source,
    }
}
