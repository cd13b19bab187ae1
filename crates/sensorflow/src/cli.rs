use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sensorflow_core::kernel::constants;

/// SensorFlow: polls sensors and dispatches triggers according to a wiring file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Wiring file (.yaml, .yml, .json or .toml)
    #[arg(
        long,
        short,
        env = constants::CONFIG_ENV_VAR,
        default_value = constants::DEFAULT_CONFIG_PATH
    )]
    pub config: PathBuf,

    /// Log at debug level
    #[arg(long, short, env = constants::DEBUG_ENV_VAR)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// List the plugins built into this binary
    Plugins,
    /// Build the wiring described by the config file, then shut it down
    Check,
}
