//! `timer` watcher: fires `0.0` every `interval`.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use sensorflow_core::config::parse_duration;
use sensorflow_core::{
    Capabilities, CancellationToken, Parameters, Plugin, PluginError, PluginRegistry, Watcher,
};

pub const NAME: &str = "timer";

#[derive(Debug, Deserialize)]
struct WatchParams {
    interval: String,
}

#[derive(Debug, Default)]
pub struct TimerPlugin;

#[async_trait]
impl Watcher for TimerPlugin {
    type Context = Duration;

    async fn watch_init(&self, params: &Parameters) -> Result<Duration, PluginError> {
        let params: WatchParams = params.decode()?;
        let interval = parse_duration(&params.interval).map_err(|reason| {
            PluginError::invalid_parameters(format!("interval '{}': {}", params.interval, reason))
        })?;
        if interval.is_zero() {
            return Err(PluginError::invalid_parameters("interval cannot be zero"));
        }
        Ok(interval)
    }

    async fn watch(
        &self,
        interval: &mut Duration,
        cancel: &CancellationToken,
    ) -> Result<f64, PluginError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(PluginError::Cancelled),
            _ = tokio::time::sleep(*interval) => Ok(0.0),
        }
    }
}

impl Plugin for TimerPlugin {
    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().with_watcher(self)
    }
}

pub fn register(registry: &mut PluginRegistry) {
    registry.register(NAME, |_params| async {
        let plugin: Arc<dyn Plugin> = Arc::new(TimerPlugin);
        Ok(plugin)
    });
}
