// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! agentctld: the supervision daemon's foreground process. Always run
//! under the supervisor in normal operation; can be run directly for
//! debugging.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use agentctl_daemon::config::Config;
use agentctl_daemon::state::{DaemonState, DEAD_LAUNCH_SWEEP_INTERVAL, PENDING_RESOLVE_INTERVAL};
use agentctl_daemon::{handlers, server, singleton};
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match Config::resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("agentctld: failed to resolve config directory: {e}");
            std::process::exit(1);
        }
    };

    if let Some(parent) = config.log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _guard = setup_logging(&config);

    let pid_lock = match singleton::enforce(&config).await {
        Ok(lock) => lock,
        Err(e) => {
            error!(error = %e, "singleton enforcement failed, refusing to start");
            std::process::exit(1);
        }
    };

    let mut daemon = match DaemonState::boot(config.clone(), pid_lock).await {
        Ok(daemon) => daemon,
        Err(e) => {
            error!(error = %e, "failed to start daemon");
            std::process::exit(1);
        }
    };

    info!(socket = %config.socket_path.display(), "daemon ready");
    println!("READY");

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to install SIGTERM handler");
            std::process::exit(1);
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to install SIGINT handler");
            std::process::exit(1);
        }
    };

    let mut flush_tick = tokio::time::interval(Duration::from_secs(1));
    let mut dead_sweep_tick = tokio::time::interval(DEAD_LAUNCH_SWEEP_INTERVAL);
    let mut pending_sweep_tick = tokio::time::interval(PENDING_RESOLVE_INTERVAL);

    loop {
        tokio::select! {
            accepted = daemon.listener.accept() => {
                match accepted {
                    Ok((stream, _)) => {
                        if let Err(e) = server::handle_connection(&mut daemon, stream).await {
                            error!(error = %e, "error handling connection");
                        }
                    }
                    Err(e) => error!(error = %e, "error accepting connection"),
                }
            }

            Some(directory) = daemon.fired_rx.recv() => {
                handlers::handle_fuse_fired(&mut daemon, &directory).await;
            }

            _ = flush_tick.tick() => {
                daemon.flush_if_due();
            }

            _ = dead_sweep_tick.tick() => {
                handlers::run_dead_launch_sweep(&mut daemon);
            }

            _ = pending_sweep_tick.tick() => {
                handlers::run_pending_resolve_sweep(&mut daemon).await;
            }

            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }

            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                break;
            }
        }

        if daemon.shutdown_requested {
            info!("shutdown requested via RPC, shutting down");
            break;
        }
    }

    daemon.shutdown();
    info!("daemon stopped");
    std::process::exit(0);
}

fn setup_logging(config: &Config) -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let parent = config
        .log_path
        .parent()
        .unwrap_or_else(|| std::path::Path::new("."));
    let file_name = config
        .log_path
        .file_name()
        .unwrap_or_else(|| std::ffi::OsStr::new("daemon.log"));
    let file_appender = tracing_appender::rolling::never(parent, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    guard
}
