//! `command` sink: runs an external command every time a value arrives.
//!
//! The value itself is not passed to the command; the command is an action
//! fired per reading or per trigger event.
use std::process::Output;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use sensorflow_core::{Capabilities, Parameters, Plugin, PluginError, PluginRegistry, Sink};

pub const NAME: &str = "command";

/// A validated `{ name, arguments }` usage
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommandSpec {
    name: String,
    #[serde(default)]
    arguments: Vec<String>,
}

impl CommandSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }
}

#[derive(Debug, Default)]
pub struct CommandPlugin;

/// Turn a finished process into the sink's result
fn check_output(spec: &CommandSpec, output: Output) -> Result<(), PluginError> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        Err(PluginError::operation(format!(
            "'{}' failed: {}",
            spec.name, output.status
        )))
    } else {
        Err(PluginError::operation(stderr.to_string()))
    }
}

#[async_trait]
impl Sink for CommandPlugin {
    type Context = CommandSpec;

    async fn write_init(&self, params: &Parameters) -> Result<CommandSpec, PluginError> {
        let spec: CommandSpec = params.decode()?;
        if spec.name.trim().is_empty() {
            return Err(PluginError::invalid_parameters("command name cannot be empty"));
        }
        Ok(spec)
    }

    async fn write(&self, spec: &mut CommandSpec, value: f64) -> Result<(), PluginError> {
        log::debug!("Running '{}' for value {}", spec.name, value);
        let output = Command::new(&spec.name)
            .args(&spec.arguments)
            .kill_on_drop(true)
            .output()
            .await?;
        check_output(spec, output)
    }
}

impl Plugin for CommandPlugin {
    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().with_sink(self)
    }
}

pub fn register(registry: &mut PluginRegistry) {
    registry.register(NAME, |_params| async {
        let plugin: Arc<dyn Plugin> = Arc::new(CommandPlugin);
        Ok(plugin)
    });
}
