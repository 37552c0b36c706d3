//! `duetask-server` entry point.
//!
//! Startup aborts with a non-zero exit when configuration, logging or the
//! task store cannot be brought up.

use duetask_core::db::open_store;
use duetask_core::{init_console_logging, init_logging};
use duetask_server::{router, AppState, ServerConfig};
use log::{error, info};
use std::process::ExitCode;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("duetask-server: {err}");
            return ExitCode::FAILURE;
        }
    };

    let logging = match config.log_dir.as_deref() {
        Some(dir) => init_logging(&config.log_level, dir),
        None => init_console_logging(&config.log_level),
    };
    if let Err(err) = logging {
        eprintln!("duetask-server: {err}");
        return ExitCode::FAILURE;
    }

    let conn = match open_store(&config.database_url) {
        Ok(conn) => conn,
        Err(err) => {
            error!("event=server_start module=server status=error error_code=store_unavailable error={err}");
            eprintln!("duetask-server: cannot open task store: {err}");
            return ExitCode::FAILURE;
        }
    };

    let listener = match TcpListener::bind(config.listen_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(
                "event=server_start module=server status=error error_code=bind_failed addr={} error={err}",
                config.listen_addr
            );
            eprintln!("duetask-server: cannot bind {}: {err}", config.listen_addr);
            return ExitCode::FAILURE;
        }
    };

    info!(
        "event=server_start module=server status=ok addr={}",
        config.listen_addr
    );

    let served = axum::serve(listener, router(AppState::new(conn)))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    match served {
        Ok(()) => {
            info!("event=server_stop module=server status=ok");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("event=server_stop module=server status=error error={err}");
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("event=server_stop module=server status=error error_code=signal_failed error={err}");
        std::future::pending::<()>().await;
    }
}
