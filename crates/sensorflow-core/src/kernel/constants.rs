/// Application name
pub const APP_NAME: &str = "SensorFlow";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration file consumed by the binary
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sensorflow/config.yaml";

/// Environment variable overriding the configuration path
pub const CONFIG_ENV_VAR: &str = "SENSORFLOW_CONFIG";

/// Environment variable enabling debug logging
pub const DEBUG_ENV_VAR: &str = "SENSORFLOW_DEBUG";
