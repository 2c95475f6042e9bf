//! proctree-monitor - version 0.1.0
//!
//! Real-time process tree monitor with tracing logging.
//! This is the main entry point that starts the polling loop and handles
//! the one-shot subcommands.

mod cli;
mod commands;
mod config;
mod state;

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn, Level};

use proctree_monitor::{CycleEvent, Poller, PsSource, RegisterServer};

use cli::{Args, Commands, LogLevel};
use commands::{command_analyze, command_check, command_config, command_tree};
use config::{render_config, resolve_config, validate_effective_config};
use state::{AppState, SharedState};

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(args: &Args) {
    let log_level = match args.log_level {
        LogLevel::Off => Level::ERROR,
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Resolves until either Ctrl-C or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// Continuous watch mode: polling loop plus optional register server.
async fn run_watch(state: SharedState, max_cycles: u64, json: bool) -> Result<()> {
    let register = if state.config.register.enabled {
        let cfg = &state.config.register;
        let server = RegisterServer::start(&cfg.address(), cfg.value).await?;
        Some(server)
    } else {
        None
    };

    let source = PsSource::new(state.config.capture_timeout());
    let poller = Poller::new(
        Arc::clone(&state.monitor),
        source,
        state.config.poll_interval(),
    );
    let mut events = poller.subscribe();
    let handle = poller.spawn();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut completed = 0u64;
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            event = events.recv() => match event {
                Ok(CycleEvent::Completed(summary)) => {
                    if json {
                        println!("{}", serde_json::to_string(&summary)?);
                    } else {
                        println!(
                            "{} cycle {:>4}: {} processes | +{} -{}",
                            summary.timestamp.format("%H:%M:%S"),
                            summary.cycle,
                            summary.total,
                            summary.created,
                            summary.removed
                        );
                    }
                    completed += 1;
                    if max_cycles > 0 && completed >= max_cycles {
                        info!("completed {} cycles, stopping", completed);
                        break;
                    }
                }
                Ok(CycleEvent::SourceFailed(err)) => {
                    warn!("cycle skipped: {}", err);
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("event consumer lagged, missed {} cycle events", missed);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    handle.stop().await;
    if let Some(server) = register {
        server.stop().await;
    }
    info!(
        "proctree-monitor stopped after {:.0?} uptime",
        state.start_time.elapsed()
    );
    Ok(())
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("Configuration is valid");
            return Ok(());
        }

        print!("{}", render_config(&config, &args.config_format)?);
        return Ok(());
    }

    // The config generator must not require a valid existing config.
    if let Some(Commands::Config { output, format }) = &args.command {
        return command_config(output.clone(), format);
    }

    let config = resolve_config(&args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("Configuration invalid: {}", e);
        std::process::exit(1);
    }

    setup_logging(&args);
    let state = AppState::new(config);

    let result = match &args.command {
        None => run_watch(state, 0, false).await,
        Some(Commands::Watch { cycles, json }) => run_watch(state, *cycles, *json).await,
        Some(Commands::Analyze { pid, format }) => command_analyze(&state, pid, format).await,
        Some(Commands::Tree { max_depth, from }) => {
            command_tree(&state, *max_depth, from.as_deref()).await
        }
        Some(Commands::Check) => command_check(&state).await,
        Some(Commands::Config { .. }) => unreachable!("Config handled above"),
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}
