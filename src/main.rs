//! Unit booking HTTP service.
//!
//! Reads configuration from a TOML file (`$BOOKING_CONFIG`, or
//! ~/.config/unit-booking/config.toml), falling back to defaults.

use std::sync::Arc;
use std::time::Duration;

use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use unit_booking::config::{AppConfig, LogFormat, LoggingConfig};
use unit_booking::infrastructure::database::migrator::Migrator;
use unit_booking::shared::{InfraError, ShutdownSignal};
use unit_booking::{
    create_api_router, init_database, BookingService, RepositoryProvider,
    SeaOrmRepositoryProvider, SystemClock,
};

fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    match logging.format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = AppConfig::resolve_path();
    let (app_cfg, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    init_logging(&app_cfg.logging);
    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => warn!(
            "Could not load config from {}: {}. Using defaults.",
            config_path.display(),
            e
        ),
    }

    info!("Starting unit booking service...");

    // ── Prometheus metrics recorder (before any metrics calls) ──
    let prometheus_handle = match metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
    {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Prometheus recorder not installed, /metrics disabled: {}", e);
            None
        }
    };

    // ── Database ───────────────────────────────────────────────
    let db_config = app_cfg.database_config();
    let db = match init_database(&db_config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(InfraError::from(e).into());
        }
    };

    info!("Running database migrations...");
    if let Err(e) = Migrator::up(&db, None).await {
        error!("Failed to run migrations: {}", e);
        return Err(InfraError::from(e).into());
    }
    info!("Migrations completed");

    let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
    let service = Arc::new(BookingService::new(repos, Arc::new(SystemClock)));

    // ── HTTP server ────────────────────────────────────────────
    let shutdown = ShutdownSignal::new();
    shutdown.listen_for_os_signals();

    let router = create_api_router(service, db.clone(), prometheus_handle);
    let addr = app_cfg.server.address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("REST API listening on http://{}", addr);
    info!("Swagger UI available at http://{}/docs/", addr);

    let api_shutdown = shutdown.clone();
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        api_shutdown.wait().await;
        info!("REST API server received shutdown signal");
    });
    let mut server_task = tokio::spawn(async move { server.await });
    let server_abort = server_task.abort_handle();

    let grace = Duration::from_secs(app_cfg.server.shutdown_timeout);
    let drain_deadline = async {
        shutdown.wait().await;
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = &mut server_task => match result {
            Ok(Ok(())) => info!("REST API server stopped"),
            Ok(Err(e)) => error!("REST API server error: {}", e),
            Err(e) => error!("REST API server task panicked: {}", e),
        },
        _ = drain_deadline => {
            warn!("In-flight requests did not finish within {:?}, forcing shutdown", grace);
            server_abort.abort();
        }
    }

    // ── Cleanup ────────────────────────────────────────────────
    if let Err(e) = db.close().await {
        warn!("Error closing database connection: {}", e);
    } else {
        info!("Database connection closed");
    }

    info!("Unit booking service shutdown complete");
    Ok(())
}
