//! Log output for the binary.
//!
//! The library and the plugins log through the `log` facade. Those records are
//! bridged into `tracing` and printed to stderr, so stdout stays free for the
//! `console` plugin.
use std::error::Error;
use std::io;

use tracing_log::LogTracer;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// `--debug` forces debug level; otherwise `RUST_LOG` applies, defaulting to info.
pub fn init(debug: bool) -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false));

    tracing::subscriber::set_global_default(subscriber)?;
    LogTracer::init()?;
    Ok(())
}
