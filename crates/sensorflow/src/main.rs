mod cli;
mod logging;

use std::error::Error;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info};

use sensorflow_core::{Manager, PluginRegistry, WiringConfig};

use cli::{CliArgs, Commands};

type BoxError = Box<dyn Error + Send + Sync>;

/// Every plugin compiled into this binary
fn builtin_registry() -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    sensorflow_console::register(&mut registry);
    sensorflow_command::register(&mut registry);
    sensorflow_timer::register(&mut registry);
    sensorflow_onewire::register(&mut registry);
    registry
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    if let Err(e) = logging::init(args.debug) {
        eprintln!("warning: failed to initialize logging: {}", e);
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("fatal: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs) -> Result<(), BoxError> {
    let registry = Arc::new(builtin_registry());

    match args.command {
        Some(Commands::Plugins) => {
            for name in registry.names() {
                println!("{}", name);
            }
            Ok(())
        }
        Some(Commands::Check) => {
            let config = load_config(&args.config)?;
            let mut manager = Manager::new(registry, &config).await?;
            let (connections, triggers) = (manager.connection_count(), manager.trigger_count());
            manager.stop().await?;
            println!(
                "configuration OK: {} connection(s), {} trigger(s)",
                connections, triggers
            );
            Ok(())
        }
        None => {
            let config = load_config(&args.config)?;
            let mut manager = Manager::new(registry, &config).await?;
            shutdown_signal().await?;
            manager.stop().await?;
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> Result<WiringConfig, BoxError> {
    info!("Loading configuration from {}", path.display());
    Ok(WiringConfig::from_path(path)?)
}

/// Wait for SIGINT or SIGTERM
async fn shutdown_signal() -> Result<(), BoxError> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Received SIGINT, shutting down");
            }
            _ = terminate.recv() => info!("Received SIGTERM, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl-C, shutting down");
    }

    Ok(())
}
