use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};

use daftar::api::{self, AppState};
use daftar_config::{Config, ConfigManager};
use daftar_core::{
    storage::{FallbackStorage, MemoryBookStorage},
    time::SystemClock,
    BookManager,
};
use daftar_storage_json::{JsonBookStorage, StoragePaths, DEFAULT_BOOK_NAME};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // DAFTAR_HOME decides where the config file itself lives.
    let mut bootstrap = Config::default();
    bootstrap.apply_env()?;
    let data_dir = bootstrap.resolve_data_dir();

    let config_manager = ConfigManager::with_base_dir(&data_dir)
        .with_context(|| format!("preparing {}", data_dir.display()))?;
    let config = config_manager.load_effective()?;
    daftar::init(config.log_filter.as_deref());
    info!(path = %config_manager.config_path().display(), "configuration loaded");

    let data_dir = config.resolve_data_dir();
    let json =
        JsonBookStorage::with_retention(StoragePaths::under(&data_dir), config.backup_retention)?;
    let storage = FallbackStorage::new(Box::new(json), Box::new(MemoryBookStorage::new()));
    let manager = BookManager::open(
        DEFAULT_BOOK_NAME,
        Box::new(storage),
        Arc::new(SystemClock),
        &config.base_currency,
    )?;
    info!(data_dir = %data_dir.display(), book = manager.name(), "book ready");

    let app = api::router(AppState::new(manager, config.display_rate()));
    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Server listening on http://{}", addr);

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", err);
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!("failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
