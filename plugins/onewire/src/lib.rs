//! `onewire` source: reads temperature sensors exposed by the kernel's w1
//! driver under `<base_dir>/<device>/temperature`, in millidegrees Celsius.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use sensorflow_core::{Capabilities, Parameters, Plugin, PluginError, PluginRegistry, Source};

pub const NAME: &str = "onewire";

pub const DEFAULT_BASE_DIR: &str = "/sys/bus/w1/devices";

#[derive(Debug, Deserialize)]
#[serde(default)]
struct PluginParams {
    base_dir: PathBuf,
}

impl Default for PluginParams {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(DEFAULT_BASE_DIR),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReadParams {
    device: String,
}

#[derive(Debug)]
pub struct OneWirePlugin {
    base_dir: PathBuf,
}

impl OneWirePlugin {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

impl Default for OneWirePlugin {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_DIR)
    }
}

/// Millidegrees as written by the driver, to degrees
fn parse_millidegrees(raw: &str) -> Result<f64, PluginError> {
    let trimmed = raw.trim();
    trimmed
        .parse::<i64>()
        .map(|milli| milli as f64 / 1000.0)
        .map_err(|e| {
            PluginError::operation(format!("bad temperature reading '{}': {}", trimmed, e))
        })
}

#[async_trait]
impl Source for OneWirePlugin {
    /// Path of the device's `temperature` file
    type Context = PathBuf;

    async fn read_init(&self, params: &Parameters) -> Result<PathBuf, PluginError> {
        let params: ReadParams = params.decode()?;
        let device = params.device.trim();
        if device.is_empty() {
            return Err(PluginError::invalid_parameters("device cannot be empty"));
        }
        Ok(self.base_dir.join(device).join("temperature"))
    }

    async fn read(&self, path: &mut PathBuf) -> Result<f64, PluginError> {
        let raw = tokio::fs::read_to_string(&*path).await?;
        parse_millidegrees(&raw)
    }
}

impl Plugin for OneWirePlugin {
    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().with_source(self)
    }
}

async fn construct(params: Parameters) -> Result<Arc<dyn Plugin>, PluginError> {
    let params: PluginParams = params.decode()?;
    log::debug!("1-Wire devices under {}", params.base_dir.display());
    Ok(Arc::new(OneWirePlugin::new(params.base_dir)))
}

pub fn register(registry: &mut PluginRegistry) {
    registry.register(NAME, construct);
}
