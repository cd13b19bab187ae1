//! Type erasure between the typed role traits and the manager.
//!
//! Each plugin picks its own `Context` type per role. The manager only ever
//! sees the object-safe `*Role` traits (to initialize a usage) and the
//! `Bound*` traits (one initialized usage, owning its context).
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::plugin_system::error::PluginError;
use crate::plugin_system::traits::{Parameters, Sink, Source, Watcher};

/// Object-safe view of a [`Source`] plugin
#[async_trait]
pub trait SourceRole: Send + Sync {
    async fn bind(&self, params: &Parameters) -> Result<Box<dyn BoundSource>, PluginError>;
}

/// Object-safe view of a [`Sink`] plugin
#[async_trait]
pub trait SinkRole: Send + Sync {
    async fn bind(&self, params: &Parameters) -> Result<Box<dyn BoundSink>, PluginError>;
}

/// Object-safe view of a [`Watcher`] plugin
#[async_trait]
pub trait WatcherRole: Send + Sync {
    async fn bind(&self, params: &Parameters) -> Result<Box<dyn BoundWatcher>, PluginError>;
}

/// One initialized source usage
#[async_trait]
pub trait BoundSource: Send {
    async fn read(&mut self) -> Result<f64, PluginError>;
    /// Close the context; later calls are no-ops.
    async fn close(&mut self);
}

/// One initialized sink usage
#[async_trait]
pub trait BoundSink: Send {
    async fn write(&mut self, value: f64) -> Result<(), PluginError>;
    /// Close the context; later calls are no-ops.
    async fn close(&mut self);
}

/// One initialized watcher usage
#[async_trait]
pub trait BoundWatcher: Send {
    async fn watch(&mut self, cancel: &CancellationToken) -> Result<f64, PluginError>;
    /// Close the context; later calls are no-ops.
    async fn close(&mut self);
}

fn closed_context() -> PluginError {
    PluginError::operation("operation context already closed")
}

pub(crate) struct SourceAdapter<S> {
    plugin: Arc<S>,
}

impl<S> SourceAdapter<S> {
    pub(crate) fn new(plugin: Arc<S>) -> Self {
        Self { plugin }
    }
}

#[async_trait]
impl<S: Source + 'static> SourceRole for SourceAdapter<S> {
    async fn bind(&self, params: &Parameters) -> Result<Box<dyn BoundSource>, PluginError> {
        let ctx = self.plugin.read_init(params).await?;
        Ok(Box::new(SourceBinding {
            plugin: Arc::clone(&self.plugin),
            ctx: Some(ctx),
        }))
    }
}

struct SourceBinding<S: Source> {
    plugin: Arc<S>,
    ctx: Option<S::Context>,
}

#[async_trait]
impl<S: Source + 'static> BoundSource for SourceBinding<S> {
    async fn read(&mut self) -> Result<f64, PluginError> {
        match self.ctx.as_mut() {
            Some(ctx) => self.plugin.read(ctx).await,
            None => Err(closed_context()),
        }
    }

    async fn close(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            self.plugin.read_close(ctx).await;
        }
    }
}

pub(crate) struct SinkAdapter<S> {
    plugin: Arc<S>,
}

impl<S> SinkAdapter<S> {
    pub(crate) fn new(plugin: Arc<S>) -> Self {
        Self { plugin }
    }
}

#[async_trait]
impl<S: Sink + 'static> SinkRole for SinkAdapter<S> {
    async fn bind(&self, params: &Parameters) -> Result<Box<dyn BoundSink>, PluginError> {
        let ctx = self.plugin.write_init(params).await?;
        Ok(Box::new(SinkBinding {
            plugin: Arc::clone(&self.plugin),
            ctx: Some(ctx),
        }))
    }
}

struct SinkBinding<S: Sink> {
    plugin: Arc<S>,
    ctx: Option<S::Context>,
}

#[async_trait]
impl<S: Sink + 'static> BoundSink for SinkBinding<S> {
    async fn write(&mut self, value: f64) -> Result<(), PluginError> {
        match self.ctx.as_mut() {
            Some(ctx) => self.plugin.write(ctx, value).await,
            None => Err(closed_context()),
        }
    }

    async fn close(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            self.plugin.write_close(ctx).await;
        }
    }
}

pub(crate) struct WatcherAdapter<W> {
    plugin: Arc<W>,
}

impl<W> WatcherAdapter<W> {
    pub(crate) fn new(plugin: Arc<W>) -> Self {
        Self { plugin }
    }
}

#[async_trait]
impl<W: Watcher + 'static> WatcherRole for WatcherAdapter<W> {
    async fn bind(&self, params: &Parameters) -> Result<Box<dyn BoundWatcher>, PluginError> {
        let ctx = self.plugin.watch_init(params).await?;
        Ok(Box::new(WatcherBinding {
            plugin: Arc::clone(&self.plugin),
            ctx: Some(ctx),
        }))
    }
}

struct WatcherBinding<W: Watcher> {
    plugin: Arc<W>,
    ctx: Option<W::Context>,
}

#[async_trait]
impl<W: Watcher + 'static> BoundWatcher for WatcherBinding<W> {
    async fn watch(&mut self, cancel: &CancellationToken) -> Result<f64, PluginError> {
        match self.ctx.as_mut() {
            Some(ctx) => self.plugin.watch(ctx, cancel).await,
            None => Err(closed_context()),
        }
    }

    async fn close(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            self.plugin.watch_close(ctx).await;
        }
    }
}

/// A bound role object tagged with the plugin name it came from
pub struct Bound<B: ?Sized> {
    plugin: String,
    op: Box<B>,
}

impl<B: ?Sized> Bound<B> {
    pub fn new(plugin: impl Into<String>, op: Box<B>) -> Self {
        Self {
            plugin: plugin.into(),
            op,
        }
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }
}

impl<B: ?Sized> Deref for Bound<B> {
    type Target = B;

    fn deref(&self) -> &B {
        &self.op
    }
}

impl<B: ?Sized> DerefMut for Bound<B> {
    fn deref_mut(&mut self) -> &mut B {
        &mut self.op
    }
}

impl<B: ?Sized> fmt::Debug for Bound<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bound")
            .field("plugin", &self.plugin)
            .finish_non_exhaustive()
    }
}
