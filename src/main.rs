// Barvagt entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config (auto-copying defaults on first run)
// 3. Construct the backend and the roster store
// 4. Create mpsc channels
// 5. Spawn the orchestrator task
// 6. Run the TUI event loop (blocking until the user quits)
// 7. Cleanup on exit

use std::sync::Arc;

use barvagt::app;
use barvagt::backend::rest::RestBackend;
use barvagt::backend::sqlite::SqliteBackend;
use barvagt::backend::BackendHandle;
use barvagt::config::{self, BackendKind, Config};
use barvagt::roster::store::RosterStore;
use barvagt::tui;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not the terminal the TUI owns)
    init_tracing()?;
    info!("Barvagt starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: {:?} addressing, {} slots from {:02}:00, {:?} save policy",
        config.schedule.mode,
        config.schedule.slot_count,
        config.schedule.first_hour,
        config.save.policy
    );

    // 3. Backend and store
    let backend = build_backend(&config).context("failed to construct backend")?;
    let store = RosterStore::new(backend, config.schedule.mode);

    // 4. Create mpsc channels
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (io_tx, io_rx) = mpsc::channel(256);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    let state = app::AppState::new(config, store, io_tx);

    // 5. Spawn the orchestrator task
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, io_rx, ui_tx, state).await {
            error!("Application loop error: {}", e);
        }
    });

    // 6. Run the TUI event loop (blocking until the user quits)
    if let Err(e) = tui::run(ui_rx, cmd_tx).await {
        error!("TUI error: {}", e);
    }

    // 7. Cleanup: wait for the orchestrator to finish (with timeout)
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    info!("Barvagt shut down cleanly");
    Ok(())
}

/// Construct the configured backend implementation.
fn build_backend(config: &Config) -> anyhow::Result<BackendHandle> {
    match config.backend.kind {
        BackendKind::Sqlite => {
            let path = resolve_sqlite_path(&config.backend.sqlite.path)?;
            info!("Opening local database at {path}");
            let backend = SqliteBackend::open(&path, &config.backend.table, config.schedule.mode)?;
            Ok(Arc::new(backend))
        }
        BackendKind::Rest => {
            // Validation guarantees url and api_key are present for this kind.
            let api_key = config.credentials.api_key.as_deref().unwrap_or_default();
            info!("Using hosted backend at {}", config.backend.rest.url);
            Ok(Arc::new(RestBackend::new(
                &config.backend.rest.url,
                api_key,
                &config.backend.table,
                config.schedule.mode,
            )))
        }
    }
}

/// Resolve the configured database path: `:memory:` and absolute paths are
/// used as-is, relative paths land in the per-user data directory.
fn resolve_sqlite_path(configured: &str) -> anyhow::Result<String> {
    if configured == ":memory:" || std::path::Path::new(configured).is_absolute() {
        return Ok(configured.to_string());
    }
    let dirs = directories::ProjectDirs::from("", "", "barvagt")
        .context("could not determine a data directory for the database")?;
    let data_dir = dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;
    Ok(data_dir.join(configured).to_string_lossy().into_owned())
}

/// Initialize tracing to log to a file (not the terminal, which is used by
/// the TUI).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    // One log file per day, appended across sessions.
    let log_name = chrono::Local::now().format("barvagt-%Y%m%d.log").to_string();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join(log_name))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("barvagt=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
