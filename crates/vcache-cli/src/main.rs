//! # vcache — Binary Entry Point
//!
//! Parses the configuration, installs logging, and runs the server until
//! Ctrl-C (or SIGTERM on Unix).

use std::process::ExitCode;

use clap::Parser;
use vcache_api::error::error_chain;
use vcache_cli::config::Args;
use vcache_cli::logging::{self, LogFormat};
use vcache_cli::server;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Args::parse().load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", error_chain(&err));
            return ExitCode::FAILURE;
        }
    };

    logging::init(LogFormat::new(config.log_json, config.no_color));

    match server::run(config, shutdown_signal()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %error_chain(&*err), "server failed");
            ExitCode::FAILURE
        }
    }
}

/// Resolves on the first shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::warn!(signal = "SIGINT", "shutdown the server"),
        _ = terminate => tracing::warn!(signal = "SIGTERM", "shutdown the server"),
    }
}
