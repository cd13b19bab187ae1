//! Mock plugins shared by the unit tests.
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::plugin_system::adapter::{SinkRole, SourceRole};
use crate::plugin_system::{
    Bound, BoundSink, BoundSource, Capabilities, Parameters, Plugin, PluginError, PluginInstances,
    PluginRegistry, Sink, Source, Watcher,
};

pub(crate) type EventLog = Arc<StdMutex<Vec<String>>>;
pub(crate) type WriteLog = Arc<StdMutex<Vec<(String, f64)>>>;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UsageParams {
    label: Option<String>,
    reject: bool,
}

impl UsageParams {
    fn parse(params: &Parameters, fallback: &str) -> Result<String, PluginError> {
        let parsed: UsageParams = params.decode()?;
        if parsed.reject {
            return Err(PluginError::invalid_parameters("rejected by test parameters"));
        }
        Ok(parsed.label.unwrap_or_else(|| fallback.to_string()))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConstantParams {
    value: Option<f64>,
}

/// Source that always reads the same value
pub(crate) struct ConstantSource {
    name: String,
    value: f64,
    events: EventLog,
}

#[async_trait]
impl Source for ConstantSource {
    type Context = String;

    async fn read_init(&self, params: &Parameters) -> Result<String, PluginError> {
        UsageParams::parse(params, &self.name)
    }

    async fn read(&self, _ctx: &mut String) -> Result<f64, PluginError> {
        Ok(self.value)
    }

    async fn read_close(&self, ctx: String) {
        self.events.lock().unwrap().push(format!("read_close:{}", ctx));
    }
}

#[async_trait]
impl Plugin for ConstantSource {
    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().with_source(self)
    }

    async fn close(&self) {
        self.events.lock().unwrap().push(format!("close:{}", self.name));
    }
}

/// Source whose reads always fail
pub(crate) struct FailingSource {
    attempts: Arc<AtomicUsize>,
}

#[async_trait]
impl Source for FailingSource {
    type Context = ();

    async fn read_init(&self, _params: &Parameters) -> Result<(), PluginError> {
        Ok(())
    }

    async fn read(&self, _ctx: &mut ()) -> Result<f64, PluginError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(PluginError::operation("sensor unplugged"))
    }
}

#[async_trait]
impl Plugin for FailingSource {
    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().with_source(self)
    }
}

/// Sink that records every write as `(label, value)`
pub(crate) struct RecordingSink {
    name: String,
    writes: WriteLog,
    events: EventLog,
}

#[async_trait]
impl Sink for RecordingSink {
    type Context = String;

    async fn write_init(&self, params: &Parameters) -> Result<String, PluginError> {
        UsageParams::parse(params, &self.name)
    }

    async fn write(&self, ctx: &mut String, value: f64) -> Result<(), PluginError> {
        self.writes.lock().unwrap().push((ctx.clone(), value));
        Ok(())
    }

    async fn write_close(&self, ctx: String) {
        self.events.lock().unwrap().push(format!("write_close:{}", ctx));
    }
}

#[async_trait]
impl Plugin for RecordingSink {
    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().with_sink(self)
    }

    async fn close(&self) {
        self.events.lock().unwrap().push(format!("close:{}", self.name));
    }
}

/// Sink whose writes always fail
pub(crate) struct FailingSink {
    attempts: Arc<AtomicUsize>,
}

#[async_trait]
impl Sink for FailingSink {
    type Context = ();

    async fn write_init(&self, _params: &Parameters) -> Result<(), PluginError> {
        Ok(())
    }

    async fn write(&self, _ctx: &mut (), _value: f64) -> Result<(), PluginError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(PluginError::operation("disk full"))
    }
}

#[async_trait]
impl Plugin for FailingSink {
    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().with_sink(self)
    }
}

/// Watcher that fails `failures` times, yields `value` once, then waits for cancellation
pub(crate) struct ScriptedWatcher {
    name: String,
    failures: usize,
    value: f64,
    events: EventLog,
}

pub(crate) struct ScriptedState {
    label: String,
    failures_left: usize,
    fired: bool,
}

#[async_trait]
impl Watcher for ScriptedWatcher {
    type Context = ScriptedState;

    async fn watch_init(&self, params: &Parameters) -> Result<ScriptedState, PluginError> {
        Ok(ScriptedState {
            label: UsageParams::parse(params, &self.name)?,
            failures_left: self.failures,
            fired: false,
        })
    }

    async fn watch(
        &self,
        ctx: &mut ScriptedState,
        cancel: &CancellationToken,
    ) -> Result<f64, PluginError> {
        if ctx.failures_left > 0 {
            ctx.failures_left -= 1;
            return Err(PluginError::operation("edge detection glitch"));
        }
        if !ctx.fired {
            ctx.fired = true;
            return Ok(self.value);
        }
        cancel.cancelled().await;
        Err(PluginError::Cancelled)
    }

    async fn watch_close(&self, ctx: ScriptedState) {
        self.events.lock().unwrap().push(format!("watch_close:{}", ctx.label));
    }
}

#[async_trait]
impl Plugin for ScriptedWatcher {
    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().with_watcher(self)
    }

    async fn close(&self) {
        self.events.lock().unwrap().push(format!("close:{}", self.name));
    }
}

/// A registry preloaded with the mock plugins, plus the probes they report into.
///
/// Registered names: `constant` (42.0 unless `value` is given at top level),
/// `recorder`, `failing-sink`, `failing-source`, `once-watcher` (7.0) and
/// `flaky-watcher` (fails three times, then 1.0).
pub(crate) struct Harness {
    pub registry: PluginRegistry,
    pub events: EventLog,
    pub writes: WriteLog,
    pub constructed: Arc<StdMutex<HashMap<String, usize>>>,
    pub read_failures: Arc<AtomicUsize>,
    pub write_failures: Arc<AtomicUsize>,
}

impl Harness {
    pub fn new() -> Self {
        let mut harness = Self {
            registry: PluginRegistry::new(),
            events: Arc::new(StdMutex::new(Vec::new())),
            writes: Arc::new(StdMutex::new(Vec::new())),
            constructed: Arc::new(StdMutex::new(HashMap::new())),
            read_failures: Arc::new(AtomicUsize::new(0)),
            write_failures: Arc::new(AtomicUsize::new(0)),
        };

        let (events, constructed) = (harness.events.clone(), harness.constructed.clone());
        harness.registry.register("constant", move |params: Parameters| {
            let events = events.clone();
            bump(&constructed, "constant");
            async move {
                params.decode::<ConstantParams>().map(|parsed| {
                    let plugin: Arc<dyn Plugin> = Arc::new(ConstantSource {
                        name: "constant".to_string(),
                        value: parsed.value.unwrap_or(42.0),
                        events,
                    });
                    plugin
                })
            }
        });

        let (events, writes, constructed) = (
            harness.events.clone(),
            harness.writes.clone(),
            harness.constructed.clone(),
        );
        harness.registry.register("recorder", move |_params| {
            let (events, writes) = (events.clone(), writes.clone());
            bump(&constructed, "recorder");
            async move {
                let plugin: Arc<dyn Plugin> = Arc::new(RecordingSink {
                    name: "recorder".to_string(),
                    writes,
                    events,
                });
                Ok(plugin)
            }
        });

        let (attempts, constructed) = (harness.write_failures.clone(), harness.constructed.clone());
        harness.registry.register("failing-sink", move |_params| {
            let attempts = attempts.clone();
            bump(&constructed, "failing-sink");
            async move {
                let plugin: Arc<dyn Plugin> = Arc::new(FailingSink { attempts });
                Ok(plugin)
            }
        });

        let (attempts, constructed) = (harness.read_failures.clone(), harness.constructed.clone());
        harness.registry.register("failing-source", move |_params| {
            let attempts = attempts.clone();
            bump(&constructed, "failing-source");
            async move {
                let plugin: Arc<dyn Plugin> = Arc::new(FailingSource { attempts });
                Ok(plugin)
            }
        });

        for (name, failures, value) in [("once-watcher", 0, 7.0), ("flaky-watcher", 3, 1.0)] {
            let (events, constructed) = (harness.events.clone(), harness.constructed.clone());
            harness.registry.register(name, move |_params| {
                let events = events.clone();
                bump(&constructed, name);
                async move {
                    let plugin: Arc<dyn Plugin> = Arc::new(ScriptedWatcher {
                        name: name.to_string(),
                        failures,
                        value,
                        events,
                    });
                    Ok(plugin)
                }
            });
        }

        harness
    }

    pub fn registry(&self) -> Arc<PluginRegistry> {
        Arc::new(self.registry.clone())
    }

    pub fn constructed(&self, name: &str) -> usize {
        self.constructed.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<(String, f64)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn writes_for(&self, label: &str) -> Vec<f64> {
        self.writes()
            .into_iter()
            .filter(|(l, _)| l == label)
            .map(|(_, v)| v)
            .collect()
    }
}

fn bump(counts: &Arc<StdMutex<HashMap<String, usize>>>, name: &str) {
    *counts.lock().unwrap().entry(name.to_string()).or_insert(0) += 1;
}

/// Parameters carrying just a label
pub(crate) fn label(label: &str) -> Parameters {
    Parameters::new(serde_json::json!({ "label": label }))
}

/// Resolve `name` and bind it as a source outside of any manager
pub(crate) async fn bound_source(
    instances: &mut PluginInstances,
    name: &str,
    params: Parameters,
) -> Bound<dyn BoundSource> {
    let instance = instances.resolve(name, None, "test").await.unwrap();
    let op = instance.require_source("test").unwrap().bind(&params).await.unwrap();
    Bound::new(name, op)
}

/// Resolve `name` and bind it as a sink outside of any manager
pub(crate) async fn bound_sink(
    instances: &mut PluginInstances,
    name: &str,
    params: Parameters,
) -> Bound<dyn BoundSink> {
    let instance = instances.resolve(name, None, "test").await.unwrap();
    let op = instance.require_sink("test").unwrap().bind(&params).await.unwrap();
    Bound::new(name, op)
}
