use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::duration::parse_duration;
use crate::config::error::ConfigError;
use crate::plugin_system::traits::Parameters;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }
}

/// A plugin reference at one usage site: which plugin, with which parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginUse {
    pub plugin: String,
    #[serde(default)]
    pub parameters: Parameters,
}

impl PluginUse {
    pub fn new(plugin: impl Into<String>, parameters: impl Into<Parameters>) -> Self {
        Self {
            plugin: plugin.into(),
            parameters: parameters.into(),
        }
    }

    /// A usage with no parameters
    pub fn bare(plugin: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            parameters: Parameters::default(),
        }
    }
}

/// Interval as written in the document: a duration string or a number of seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntervalValue {
    Seconds(f64),
    Text(String),
}

impl fmt::Display for IntervalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntervalValue::Seconds(secs) => write!(f, "{}", secs),
            IntervalValue::Text(text) => write!(f, "{}", text),
        }
    }
}

impl From<Duration> for IntervalValue {
    fn from(duration: Duration) -> Self {
        IntervalValue::Seconds(duration.as_secs_f64())
    }
}

impl From<f64> for IntervalValue {
    fn from(seconds: f64) -> Self {
        IntervalValue::Seconds(seconds)
    }
}

impl From<&str> for IntervalValue {
    fn from(text: &str) -> Self {
        IntervalValue::Text(text.to_string())
    }
}

/// Longest accepted connection interval, about 292 years
pub const MAX_INTERVAL: Duration = Duration::from_nanos(i64::MAX as u64);

/// One source polled on an interval and fanned out to its outputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub input: PluginUse,
    #[serde(default)]
    pub outputs: Vec<PluginUse>,
    #[serde(default)]
    pub interval: Option<IntervalValue>,
}

impl ConnectionConfig {
    /// Parse and validate the interval; `entry` names this connection in errors.
    pub fn interval(&self, entry: &str) -> Result<Duration, ConfigError> {
        let invalid = |value: String, reason: String| ConfigError::InvalidInterval {
            entry: entry.to_string(),
            value,
            reason,
        };
        let raw = self
            .interval
            .as_ref()
            .ok_or_else(|| invalid("<missing>".to_string(), "interval is required".to_string()))?;
        let duration = match raw {
            IntervalValue::Seconds(secs) => Duration::try_from_secs_f64(*secs)
                .map_err(|e| invalid(raw.to_string(), e.to_string()))?,
            IntervalValue::Text(text) => {
                parse_duration(text).map_err(|reason| invalid(raw.to_string(), reason))?
            }
        };
        if duration.is_zero() {
            return Err(invalid(raw.to_string(), "interval cannot be zero".to_string()));
        }
        if duration > MAX_INTERVAL {
            return Err(invalid(
                raw.to_string(),
                format!("interval cannot exceed {:?}", MAX_INTERVAL),
            ));
        }
        Ok(duration)
    }
}

/// One watcher fanned out to its actions on every event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerConfig {
    pub watch: PluginUse,
    #[serde(default)]
    pub actions: Vec<PluginUse>,
}

/// The wiring document consumed by the manager
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WiringConfig {
    /// Plugins constructed up front with explicit top-level parameters
    #[serde(default)]
    pub plugins: BTreeMap<String, Parameters>,
    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,
    #[serde(default)]
    pub triggers: Vec<TriggerConfig>,
}

impl WiringConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a document, picking the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&data, format)
    }

    /// Deserialize from string based on format
    pub fn from_str(data: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        match format {
            ConfigFormat::Json => {
                serde_json::from_str(data).map_err(|e| ConfigError::parse("json", e))
            }
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => {
                // An empty YAML file is a null document, not an empty map
                if data.trim().is_empty() {
                    return Ok(Self::default());
                }
                serde_yaml::from_str(data).map_err(|e| ConfigError::parse("yaml", e))
            }
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(data).map_err(|e| ConfigError::parse("toml", e)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty() && self.triggers.is_empty()
    }

    /// Builder-style helpers, mostly for tests and embedding
    pub fn with_plugin(mut self, name: impl Into<String>, params: impl Into<Parameters>) -> Self {
        self.plugins.insert(name.into(), params.into());
        self
    }

    pub fn with_connection(
        mut self,
        input: PluginUse,
        outputs: Vec<PluginUse>,
        interval: impl Into<IntervalValue>,
    ) -> Self {
        self.connections.push(ConnectionConfig {
            input,
            outputs,
            interval: Some(interval.into()),
        });
        self
    }

    pub fn with_trigger(mut self, watch: PluginUse, actions: Vec<PluginUse>) -> Self {
        self.triggers.push(TriggerConfig { watch, actions });
        self
    }
}

/// Wiring locations used in error messages and logs
pub(crate) mod entry {
    pub fn plugin(name: &str) -> String {
        format!("plugins.{}", name)
    }

    pub fn connection(index: usize) -> String {
        format!("connections[{}]", index)
    }

    pub fn connection_input(index: usize) -> String {
        format!("connections[{}].input", index)
    }

    pub fn connection_output(index: usize, output: usize) -> String {
        format!("connections[{}].outputs[{}]", index, output)
    }

    pub fn trigger_watch(index: usize) -> String {
        format!("triggers[{}].watch", index)
    }

    pub fn trigger_action(index: usize, action: usize) -> String {
        format!("triggers[{}].actions[{}]", index, action)
    }
}
