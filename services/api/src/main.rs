use std::net::SocketAddr;

use anyhow::{Context, Result};
use api::{
    AppState, Settings, StorageBackend, create_router,
    repositories::{MemoryRideRepository, PgRideRepository, RideRepository},
    state::Stores,
};
use auth::{AuthConfig, AuthService, MemoryUserRepository, PgUserRepository, UserRepository};
use common::{Database, DatabaseConfig};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Ride Ledger API");

    let settings = Settings::load().context("Failed to load settings")?;
    let auth_config = AuthConfig::from_env().context("Failed to load auth configuration")?;

    if settings.expose_internal_errors {
        warn!("EXPOSE_INTERNAL_ERRORS is set; internal error details will reach clients");
    }

    let addr = settings.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;

    match settings.storage {
        StorageBackend::Postgres => {
            let database = Database::open(&DatabaseConfig::from_env()?).await?;
            database.migrate().await?;
            info!("Database ready: {:?}", database.status());

            let users = PgUserRepository::new(database.pool().clone());
            let auth = AuthService::new(users, auth_config)?;
            let rides = PgRideRepository::new(database.pool().clone());
            let state = AppState::new(auth, rides, Some(database.clone()), &settings);

            let served = serve(listener, state, settings.seed_default_users).await;
            database.close().await;
            served?;
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; data is lost on shutdown");

            let auth = AuthService::new(MemoryUserRepository::new(), auth_config)?;
            let state = AppState::new(auth, MemoryRideRepository::new(), None, &settings);

            serve(listener, state, settings.seed_default_users).await?;
        }
    }

    info!("Ride Ledger API stopped");
    Ok(())
}

async fn serve<U, R>(listener: TcpListener, state: AppState<U, R>, seed: bool) -> Result<()>
where
    U: UserRepository + Stores,
    R: RideRepository + Stores,
{
    if seed {
        let created = state.auth.seed_default_users().await?;
        info!("Default users ensured ({} created)", created);
    }

    let app = create_router(state);

    info!("Ride Ledger API listening on {}", listener.local_addr()?);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
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
