//! # SensorFlow Configuration
//!
//! The wiring document: which plugins to pre-construct, which sources feed
//! which sinks on which interval, and which watchers fan out to which actions.
//! Documents load from JSON, YAML or TOML ([`ConfigFormat`]).
pub mod duration;
pub mod error;
pub mod wiring;

pub use duration::parse_duration;
pub use error::ConfigError;
pub use wiring::{
    ConfigFormat, ConnectionConfig, IntervalValue, PluginUse, TriggerConfig, WiringConfig,
    MAX_INTERVAL,
};
