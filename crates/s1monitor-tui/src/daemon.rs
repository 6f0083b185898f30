//! Headless mode: run the monitor and log until the process is told to stop.

use anyhow::Result;
use s1monitor_core::{EventSink, Intervals, Monitor, SessionClient};
use tracing::info;

use crate::logging::LOG_FILE;

pub async fn run(client: SessionClient, intervals: Intervals) -> Result<()> {
    info!("Starting in daemon mode");
    println!("s1monitor is running in daemon mode, see {} for details", LOG_FILE);

    let username = client.username().to_string();
    let handle = Monitor::new(client, username, intervals, EventSink::disconnected()).spawn();

    wait_for_termination().await?;
    info!("Termination signal received, shutting down");

    handle.shutdown().await;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_termination() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result?,
        _ = terminate.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_termination() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
