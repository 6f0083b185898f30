//! s1monitor - keeps a Stage1st forum account logged in.
//!
//! Runs a background session monitor that logs in, re-checks the session
//! every minute, and retries quickly when something goes wrong. Progress is
//! shown in a terminal view, or only logged when started with `--daemon`.

mod app;
mod daemon;
mod logging;
mod ui;

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use s1monitor_core::config::DEFAULT_CONFIG_FILE;
use s1monitor_core::lock::LOCK_FILE;
use s1monitor_core::{
    Config, ConfigError, EventSink, InstanceLock, Intervals, Monitor, SessionClient,
};
use tokio::sync::mpsc;
use tracing::{error, info};

use app::{App, AppState, CHANNEL_BUFFER_SIZE};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

#[derive(Parser, Debug)]
#[command(name = "s1monitor", version, about = "Keeps a Stage1st forum account logged in")]
struct Cli {
    /// Config file path; relative paths are resolved against the executable's directory
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Run headless, logging to file only
    #[arg(short, long)]
    daemon: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let work_dir = executable_dir()?;
    let config_path = resolve_path(&work_dir, &cli.config);

    let _log_guard = logging::init_tracing(&work_dir, cli.daemon)?;
    info!(version = env!("CARGO_PKG_VERSION"), "s1monitor starting");

    let lock_path = work_dir.join(LOCK_FILE);
    let _lock = InstanceLock::acquire(&lock_path)
        .inspect_err(|e| error!(error = %e, "Could not acquire instance lock"))?;

    let mut config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(ConfigError::NotFound(path)) => {
            info!(path = %path.display(), "Config file not found, writing default");
            Config::write_default(&path).context("Failed to create default config")?;
            println!(
                "Default config created at {}, edit it and start s1monitor again",
                path.display()
            );
            return Ok(());
        }
        Err(e) => {
            error!(error = %e, "Failed to load config");
            return Err(e).context("Failed to load config");
        }
    };
    config.apply_env_overrides();

    let credentials = config.credentials().context("Invalid config")?;
    let client = SessionClient::new(credentials).context("Failed to create session client")?;

    if cli.daemon {
        daemon::run(client, config.intervals()).await?;
    } else {
        info!("Starting in console mode");
        run_console(client, config.intervals()).await?;
    }

    info!("s1monitor shutting down");
    Ok(())
}

/// Directory holding the executable; config, lock and log files live there.
fn executable_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate executable")?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow::anyhow!("Executable has no parent directory"))
}

fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

async fn run_console(client: SessionClient, intervals: Intervals) -> Result<()> {
    let username = client.username().to_string();
    let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
    let mut app = App::new(username.clone(), rx);
    let handle = Monitor::new(client, username, intervals, EventSink::new(tx)).spawn();

    let result = match setup_terminal() {
        Ok(mut terminal) => {
            let result = run_app(&mut terminal, &mut app).await;
            let _ = terminal.show_cursor();
            result
        }
        Err(e) => Err(e),
    };
    restore_terminal();

    // The monitor is stopped whether or not the console came up
    info!("Exit requested, stopping session monitor");
    handle.shutdown().await;

    if let Err(ref e) = result {
        error!(error = %e, "Console failed");
        eprintln!("Error: {}", e);
    }
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    Ok(terminal)
}

/// Best-effort restore; runs after partial setup too.
fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow monitor updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ignore key release/repeat events reported on some platforms
                if key.kind == KeyEventKind::Press && handle_input(app, key) {
                    return Ok(());
                }
            }
        }

        // Pick up anything the monitor reported
        app.check_monitor_events();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
