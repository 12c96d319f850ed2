//! Process bootstrap: logging, storage, listener, graceful shutdown.

use crate::config::ServerArgs;
use crate::error::ServerError;
use crate::routes::{router, AppState};
use hitbadge_core::{core_version, init_logging, init_stderr_logging, CounterStore};
use log::{error, info};
use tokio::net::TcpListener;

/// Runs the server until ctrl-c.
///
/// # Errors
/// - `ServerError::Store` when the database cannot be opened; nothing is served.
/// - `ServerError::Bind` when the listen address is unavailable.
pub async fn run(args: ServerArgs) -> Result<(), ServerError> {
    match args.log_dir.as_deref() {
        Some(dir) => init_logging(&args.log_level, dir),
        None => init_stderr_logging(&args.log_level),
    }
    .map_err(ServerError::Logging)?;

    info!(
        "event=server_start module=server version={} db={} pool_size={}",
        core_version(),
        args.db.display(),
        args.pool_size
    );

    let store = CounterStore::open(&args.db, args.pool_size).inspect_err(|err| {
        error!("event=server_start module=server status=error error={err}");
    })?;

    let db_location = store
        .location()
        .map_or_else(|| "memory".to_string(), |path| path.display().to_string());

    let addr = args.listen_addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!("event=server_listen module=server status=ok addr={addr} db={db_location}");

    axum::serve(listener, router(AppState::new(store)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    info!("event=server_stop module=server status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("event=shutdown_signal module=server status=error error={err}");
        std::future::pending::<()>().await;
    }
}
