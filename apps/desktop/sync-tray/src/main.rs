use sync_tray::error::TrayError;
use sync_tray::launch::LaunchInfo;
use sync_tray::logger::initialize as LoggerInitialize;
use sync_tray::reporter::report_events;

use sync_client::config::ClientConfig;
use sync_client::{TeardownReason, start_session};

use common::ErrorLocation;

use std::fs::create_dir_all;
use std::panic::Location;
use std::path::PathBuf;
use std::process::ExitCode;

use log::{error, info, warn};
use tokio::time::{Duration, timeout};

const REPORTER_DRAIN: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), TrayError> {
    let launch_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .ok_or_else(|| TrayError::launch("usage: sync-tray <launch-file>"))?;

    let config_dir = ClientConfig::default_dir()?;
    create_dir_all(&config_dir).map_err(|e| TrayError::Tray {
        message: format!(
            "Failed to create config directory {}: {e}",
            config_dir.display()
        ),
        location: ErrorLocation::from(Location::caller()),
    })?;

    // Initialize logger FIRST
    LoggerInitialize(&config_dir)?;

    info!("Sync tray starting");
    info!("Config directory: {}", config_dir.display());

    let launch = LaunchInfo::consume(&launch_path)?;
    let config = ClientConfig::load(&config_dir)?;
    let endpoint = launch.endpoint(&config);

    let (handle, events) = start_session(&endpoint, launch.identity.clone(), &config).await?;
    let reporter = tokio::spawn(report_events(handle.clone(), events));

    let reason = tokio::select! {
        reason = handle.closed() => reason,
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!("Failed to listen for Ctrl-C: {e}");
            }
            info!("Interrupted, shutting down");
            if let Err(e) = handle.request_shutdown().await {
                warn!("Shutdown request not delivered: {e}");
            }
            handle.closed().await
        }
    };

    // The reporter stops on the teardown event; don't hang if it missed it.
    if timeout(REPORTER_DRAIN, reporter).await.is_err() {
        warn!("Event reporter did not finish");
    }

    match reason {
        Some(TeardownReason::UserShutdown) | Some(TeardownReason::TransportClosed) => {
            info!("Sync tray exiting");
            Ok(())
        }
        Some(other) => Err(TrayError::Session {
            message: other.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }),
        None => Err(TrayError::Session {
            message: String::from("session ended without a reason"),
            location: ErrorLocation::from(Location::caller()),
        }),
    }
}
