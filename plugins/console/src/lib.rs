//! `console` sink: prints every value it receives as `label: value`.
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use sensorflow_core::{Capabilities, Parameters, Plugin, PluginError, PluginRegistry, Sink};

/// Name this plugin registers under
pub const NAME: &str = "console";

const DEFAULT_LABEL: &str = "Value";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WriteParams {
    label: Option<String>,
}

#[derive(Debug, Default)]
pub struct ConsolePlugin;

impl ConsolePlugin {
    /// One output line, without the trailing newline
    pub fn format_line(label: &str, value: f64) -> String {
        format!("{}: {:.6}", label, value)
    }
}

#[async_trait]
impl Sink for ConsolePlugin {
    type Context = String;

    async fn write_init(&self, params: &Parameters) -> Result<String, PluginError> {
        let params: WriteParams = params.decode()?;
        Ok(params
            .label
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| DEFAULT_LABEL.to_string()))
    }

    async fn write(&self, label: &mut String, value: f64) -> Result<(), PluginError> {
        println!("{}", Self::format_line(label, value));
        Ok(())
    }
}

impl Plugin for ConsolePlugin {
    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().with_sink(self)
    }
}

pub fn register(registry: &mut PluginRegistry) {
    registry.register(NAME, |_params| async {
        log::debug!("Constructing {} plugin", NAME);
        let plugin: Arc<dyn Plugin> = Arc::new(ConsolePlugin);
        Ok(plugin)
    });
}
